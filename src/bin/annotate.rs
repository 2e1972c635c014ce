fn main() {
    if let Err(e) = arenalabel::run_annotate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
