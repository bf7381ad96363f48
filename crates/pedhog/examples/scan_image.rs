use pedhog::{Session, SessionConfig};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <model.txt> <image.png> [marked.png]", args[0]);
        std::process::exit(2);
    }

    let mut session = Session::new(SessionConfig::default());
    session.set_model_path(&args[1]);
    session.load_model()?;

    let scan = session.scan_image(Path::new(&args[2]))?;
    println!("Detected {} pedestrians.", scan.detections.len());
    for det in &scan.detections {
        println!("  x = {:4}  score = {:.3}", det.x, det.score);
    }

    if let Some(out_path) = args.get(3) {
        scan.image.save(out_path)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
