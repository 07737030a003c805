fn main() -> Result<(), Box<dyn std::error::Error>> {
    bundlecp_cli::run()
}
