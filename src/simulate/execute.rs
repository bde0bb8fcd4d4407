use{
    super::*,
    std::{
        fs::File,
        io::{BufWriter, Write},
        num::*,
    },
    serde_json::Value,
    crate::{
        error::*,
        epidemic_model::{Environment, History, write_jsons},
        replicates::ReplicateRunner,
        stats_methods::MetricSummary,
    },
};

pub fn run_simulation(
    param: SimulateParams,
    json: Value,
    num_threads: Option<NonZeroUsize>,
    show_progress: bool
) -> Result<()>
{
    let k = num_threads.map_or(1, NonZeroUsize::get);
    rayon::ThreadPoolBuilder::new()
        .num_threads(k)
        .build_global()
        .map_err(|e| EpidemicError::InvalidOption{name: "num_threads", reason: e.to_string()})?;

    let template = Environment::new(&param.options)?;
    tracing::info!(
        "population of {} nodes, {} edges",
        template.graph().vertex_count(),
        template.graph().edge_count()
    );
    let runner = ReplicateRunner::new(template, param.replicates.get(), param.steps.get())
        .seed(param.replicate_seed)
        .show_progress(show_progress);
    let policy = &param.policy;
    let batch = runner.run(|| policy.clone())?;

    write_summary(&batch.summaries(), &param, &json, num_threads)?;
    if param.write_histories{
        write_histories(batch.histories(), &param, num_threads)?;
    }
    Ok(())
}

fn write_summary(
    summaries: &[MetricSummary],
    param: &SimulateParams,
    json: &Value,
    num_threads: Option<NonZeroUsize>
) -> Result<()>
{
    let name = param.name("summary", "dat", num_threads);
    tracing::info!("creating: {name}");
    let file = File::create(name)?;
    let mut buf = BufWriter::new(file);
    write_summary_table(&mut buf, summaries, json)?;
    buf.flush()?;
    Ok(())
}

/// One row per step, mean and variance of every metric across replicates
pub fn write_summary_table<W: Write>(mut writer: W, summaries: &[MetricSummary], json: &Value) -> Result<()>
{
    write_jsons(std::slice::from_ref(json), &mut writer)?;
    writeln!(writer, "#samples {}", summaries.first().map_or(0, |s| s.samples))?;
    write!(writer, "#")?;
    for summary in summaries{
        write!(writer, "{0}_mean {0}_var ", summary.metric)?;
    }
    writeln!(writer)?;

    let steps = summaries.iter().map(|s| s.per_step.len()).max().unwrap_or(0);
    for step in 0..steps{
        for summary in summaries{
            match summary.per_step.get(step){
                Some(v) => write!(writer, "{:e} {:e} ", v.mean, v.var)?,
                None => write!(writer, "NaN NaN ")?
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_histories(histories: &[History], param: &SimulateParams, num_threads: Option<NonZeroUsize>) -> Result<()>
{
    let name = param.name("histories", "bincode", num_threads);
    tracing::info!("creating: {name}");
    let file = File::create(name)?;
    let mut buf = BufWriter::new(file);
    bincode::serialize_into(&mut buf, histories)?;
    buf.flush()?;
    Ok(())
}
