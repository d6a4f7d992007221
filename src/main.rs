fn main() -> anyhow::Result<()> {
    nestrouter::cli::run_cli()
}
