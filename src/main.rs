fn main() {
    if let Err(err) = corner_label_renderer::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
