fn main() {
    if let Err(e) = arenalabel::run_detect() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
