fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{}", prescription_portal::USAGE);
        return;
    }

    // --steps / --thresholds / --print-config, each optionally with --config <file>.
    // Exits 0 on success, 1 on failure, 2 on a usage error.
    let cli = match prescription_portal::parse_args(&args) {
        Ok(cli) => cli,
        Err(msg) => {
            eprintln!("prescription-portal: {}", msg);
            eprintln!("{}", prescription_portal::USAGE);
            std::process::exit(2);
        }
    };

    std::process::exit(prescription_portal::run(&cli));
}
