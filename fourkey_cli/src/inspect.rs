use fourkey_schema::{Beatmap, LANE_COUNT};

pub fn print_summary(map: &Beatmap) {
    println!("format: {:?}", map.format);
    println!("title: {}", map.title().unwrap_or("-"));
    println!("artist: {}", map.artist().unwrap_or("-"));
    println!("version: {}", map.version().unwrap_or("-"));
    println!("source keys: {}", map.key_count);

    let mut per_lane = [0usize; LANE_COUNT];
    for obj in &map.hit_objects {
        if let Some(count) = per_lane.get_mut(usize::from(obj.column)) {
            *count += 1;
        }
    }
    println!(
        "objects: {} ({} long notes), per lane {:?}",
        map.hit_objects.len(),
        map.long_note_count(),
        per_lane
    );
    println!("judgements: {}", map.total_judgements());
    println!(
        "timing points: {} ({} tempo)",
        map.raw_timing_points.len(),
        map.raw_timing_points.iter().filter(|p| p.uninherited).count()
    );
    println!("sv segments: {}", map.sv.segments.len());
    println!("combined segments: {}", map.combined.segments.len());
    println!("measures: {}", map.measures.len());
    println!("last object end: {}ms", map.last_object_end());
}
