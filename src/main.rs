use pulse_cli::app::startup;

#[tokio::main]
async fn main() {
    let code = startup::startup().await;
    std::process::exit(code);
}
