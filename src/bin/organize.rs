fn main() {
    if let Err(e) = arenalabel::run_organize() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
