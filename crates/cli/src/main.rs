fn main() -> Result<(), Box<dyn std::error::Error>> {
    codedash_cli::run()
}
