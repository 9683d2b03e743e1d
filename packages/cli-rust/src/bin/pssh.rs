//! pssh binary entry point

fn main() -> anyhow::Result<()> {
    pssh::run()
}
