use fourkey_runner::SimulationReport;

pub fn print_timeline(report: &SimulationReport) {
    println!("Time(ms) | Lane | Part | Judgement | Offset");
    println!("---------|------|------|-----------|-------");
    for event in &report.judgements {
        println!(
            "{:>8.1} | {:>4} | {:<4} | {:<9} | {:+.1}",
            event.time_ms,
            event.lane,
            if event.is_head { "head" } else { "tail" },
            format!("{:?}", event.tier),
            event.delta_ms
        );
    }
    println!(
        "{} frames, finished={}",
        report.frames, report.finished
    );
}
