fn main() -> anyhow::Result<()> {
    recovery_input_lib::run()
}
