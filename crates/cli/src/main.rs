//! MQ Throughput CLI entry point.

fn main() {
    if let Err(e) = mq_throughput_cli::run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
