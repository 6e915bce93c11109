#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classroom_grader::run().await {
        eprintln!("classroom-grader fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
