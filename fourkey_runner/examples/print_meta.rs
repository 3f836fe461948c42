use std::path::PathBuf;

use clap::Parser;
use fourkey_chart::ParseOptions;

#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let report = fourkey_runner::load_chart(&args.path, &ParseOptions::default())?;
    let map = &report.beatmap;
    println!("title={}", map.title().unwrap_or_default());
    println!("artist={}", map.artist().unwrap_or_default());
    println!("version={}", map.version().unwrap_or_default());
    println!("objects={}", map.hit_objects.len());
    println!("long_notes={}", map.long_note_count());
    println!("source_keys={}", map.key_count);
    println!("warnings={}", report.warnings.len());
    Ok(())
}
