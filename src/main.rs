fn main() {
    let result = match std::env::args().nth(1).as_deref() {
        Some("watch") => careline_lib::watch(),
        _ => careline_lib::run(),
    };
    if let Err(e) = result {
        eprintln!("careline: {e}");
        std::process::exit(1);
    }
}
