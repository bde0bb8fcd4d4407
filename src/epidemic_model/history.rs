use{
    std::{
        collections::BTreeMap,
        io::{Write, Read},
    },
    serde::{Serialize, Deserialize},
    serde_json::Value,
    crate::error::*,
};

/// Everything logged for one step
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StepRecord{
    pub step: usize,
    pub new_infections: usize,
    pub seeded_infections: usize,
    pub total_infections: usize,
    pub current_infected: usize,
    pub current_clear: usize,
    pub current_immune: usize,
    pub current_isolated: usize,
    pub current_masked: usize,
    pub deaths: usize,
    pub total_deaths: usize,
    pub recoveries: usize,
    pub total_recoveries: usize,
    pub tests: usize,
    pub known_new_infections: usize,
    pub known_total_infections: usize,
    pub known_infected: usize,
    pub known_clear: usize,
    pub known_immune: usize,
    pub known_unknown: usize,
    pub prop_infected: f64,
    pub prop_known_infected: f64,
    pub healthcare_penalty: f64,
    pub action_cost: f64,
    pub actions_taken: usize,
    pub score: f64,
    pub observed_score: f64,
    pub total_score: f64,
    pub total_observed_score: f64,
    pub edges: usize,
}

impl StepRecord{
    pub fn entries(&self) -> [(&'static str, f64); 30]
    {
        [
            ("step", self.step as f64),
            ("new_infections", self.new_infections as f64),
            ("seeded_infections", self.seeded_infections as f64),
            ("total_infections", self.total_infections as f64),
            ("current_infected", self.current_infected as f64),
            ("current_clear", self.current_clear as f64),
            ("current_immune", self.current_immune as f64),
            ("current_isolated", self.current_isolated as f64),
            ("current_masked", self.current_masked as f64),
            ("deaths", self.deaths as f64),
            ("total_deaths", self.total_deaths as f64),
            ("recoveries", self.recoveries as f64),
            ("total_recoveries", self.total_recoveries as f64),
            ("tests", self.tests as f64),
            ("known_new_infections", self.known_new_infections as f64),
            ("known_total_infections", self.known_total_infections as f64),
            ("known_infected", self.known_infected as f64),
            ("known_clear", self.known_clear as f64),
            ("known_immune", self.known_immune as f64),
            ("known_unknown", self.known_unknown as f64),
            ("prop_infected", self.prop_infected),
            ("prop_known_infected", self.prop_known_infected),
            ("healthcare_penalty", self.healthcare_penalty),
            ("action_cost", self.action_cost),
            ("actions_taken", self.actions_taken as f64),
            ("score", self.score),
            ("observed_score", self.observed_score),
            ("total_score", self.total_score),
            ("total_observed_score", self.total_observed_score),
            ("edges", self.edges as f64),
        ]
    }
}

/// Append only time series, one per metric
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct History{
    series: BTreeMap<String, Vec<f64>>,
    len: usize,
}

impl History{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn log(&mut self, record: &StepRecord)
    {
        for (name, value) in record.entries(){
            self.series
                .entry(name.to_owned())
                .or_default()
                .push(value);
        }
        self.len += 1;
    }

    /// number of logged steps
    pub fn len(&self) -> usize
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    pub fn get(&self, metric: &str) -> Option<&[f64]>
    {
        self.series.get(metric).map(Vec::as_slice)
    }

    pub fn last(&self, metric: &str) -> Option<f64>
    {
        self.get(metric).and_then(|series| series.last().copied())
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str>
    {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])>
    {
        self.series.iter().map(|(name, series)| (name.as_str(), series.as_slice()))
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()>
    {
        serde_json::to_writer(writer, &self.series)?;
        Ok(())
    }

    pub fn write_bincode<W: Write>(&self, writer: W) -> Result<()>
    {
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    pub fn read_bincode<R: Read>(reader: R) -> Result<Self>
    {
        Ok(bincode::deserialize_from(reader)?)
    }

    /// One column per metric, one row per step.
    /// `jsons` are written as comment lines on top, e.g. the options of the run
    pub fn write_table<W: Write>(&self, mut writer: W, jsons: &[Value]) -> Result<()>
    {
        write_jsons(jsons, &mut writer)?;
        write!(writer, "#")?;
        for name in self.metric_names(){
            write!(writer, "{name} ")?;
        }
        writeln!(writer)?;
        for i in 0..self.len{
            for (_, series) in self.iter(){
                write!(writer, "{} ", series[i])?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

pub fn write_jsons<W: Write>(jsons: &[Value], mut writer: W) -> std::io::Result<()>
{
    for j in jsons{
        write!(writer, "#")?;
        serde_json::to_writer(&mut writer, j)?;
        writeln!(writer)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(step: usize) -> StepRecord
    {
        StepRecord{
            step,
            total_infections: step * 2,
            score: 1.5,
            ..StepRecord::default()
        }
    }

    #[test]
    fn every_metric_grows_in_lockstep() {
        let mut history = History::new();
        for step in 0..5{
            history.log(&record(step));
        }
        assert_eq!(history.len(), 5);
        assert_eq!(history.metric_names().count(), 30);
        assert!(history.iter().all(|(_, series)| series.len() == 5));
        assert_eq!(history.get("total_infections"), Some(&[0.0, 2.0, 4.0, 6.0, 8.0][..]));
        assert_eq!(history.last("score"), Some(1.5));
        assert_eq!(history.get("no_such_metric"), None);
    }

    #[test]
    fn bincode_round_trip() {
        let mut history = History::new();
        history.log(&record(0));
        history.log(&record(1));
        let mut buf = Vec::new();
        history.write_bincode(&mut buf).unwrap();
        assert_eq!(History::read_bincode(buf.as_slice()).unwrap(), history);
    }

    #[test]
    fn table_has_header_and_rows() {
        let mut history = History::new();
        history.log(&record(0));
        history.log(&record(1));
        let mut buf = Vec::new();
        history.write_table(&mut buf, &[serde_json::json!({"seed": 1})]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "#{\"seed\":1}");
        assert!(lines[1].starts_with("#action_cost"));
    }
}
