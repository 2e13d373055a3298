fn main() {
    if let Err(err) = property_search::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(property_search::exit_code(&err));
    }
}
