fn main() -> anyhow::Result<()> {
    fluid_backdrop::app::run()
}
