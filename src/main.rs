fn main() {
    if let Err(e) = schemasplit::run() {
        schemasplit::core::diag::print_error(&e.to_string());
        std::process::exit(1);
    }
}
