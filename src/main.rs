fn main() -> anyhow::Result<()> {
    ic_cli::run()
}
