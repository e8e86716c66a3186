use std::process::ExitCode;

use clap::Parser;
use echo_server::{ClientError, EchoClient, logging};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "echo-client")]
#[command(version)]
#[command(about = "Posts a message to an echo server twice over one connection", long_about = None)]
struct Args {
    /// Server url, e.g. http://127.0.0.1:8080/
    url: String,

    /// Message to send
    msg: String,

    /// Dump every exchanged byte in hex on stderr
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = logging::init_client(args.debug) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(url = %args.url, cause = %e, "echo exchange failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), ClientError> {
    let mut client = EchoClient::connect(&args.url).await?;

    for again in ["", " (again)"] {
        println!("Sending message{again}: \"{}\"...", args.msg);
        let reply = client.post(args.msg.as_bytes()).await?;
        println!("Got reply: \"{}\"!", String::from_utf8_lossy(&reply));
    }

    Ok(())
}
