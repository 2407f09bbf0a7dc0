fn main() {
    if let Err(err) = portcast_consolidation::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
