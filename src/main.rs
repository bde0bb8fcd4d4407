use{
    std::time::Instant,
    structopt::StructOpt,
    tracing_subscriber::EnvFilter,
    epidemic_env::simulate,
};

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let start_time = Instant::now();
    let opt = CmdOption::from_args();
    let result = match opt{
        CmdOption::Simulate(o) => o.execute(),
    };
    println!("Execution took {}", humantime::format_duration(start_time.elapsed()));
    if let Err(e) = result{
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

#[derive(Debug, StructOpt, Clone)]
#[structopt(about = "Epidemic control environment on community networks")]
pub enum CmdOption
{
    Simulate(simulate::Simulate),
}
