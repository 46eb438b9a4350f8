use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    bavard::cli::main()
}
