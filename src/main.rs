#[derive(clap::Parser)]
#[clap(author, version, about = "Vela AWS credentials plugin for temporary AWS credentials.")]
struct Cli {
    #[clap(flatten)]
    exec: vela_aws_credentials::cmd::exec::ExecArgs,
}

fn main() {
    use clap::Parser as _;
    let cli = Cli::parse();

    if let Err(e) = vela_aws_credentials::cmd::exec::run(&cli.exec) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
