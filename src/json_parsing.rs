use{
    std::{fs::File, io::BufReader},
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    crate::error::*,
};

/// Reads the parameters from the json file at `file`.
///
/// Without a file the default parameters are printed as json,
/// so they can be used as a template, and returned.
pub fn parse<T>(file: Option<&String>) -> Result<(T, Value)>
where T: Default + Serialize + DeserializeOwned
{
    match file{
        None => {
            let example = T::default();
            serde_json::to_writer_pretty(std::io::stdout(), &example)?;
            println!();
            let json = serde_json::to_value(&example)?;
            Ok((example, json))
        },
        Some(filename) => {
            let reader = BufReader::new(File::open(filename)?);
            let json: Value = serde_json::from_reader(reader)?;
            tracing::info!("read parameters from {}", filename);
            let opt: T = serde_json::from_value(json)?;
            // the value of the parsed options also contains the defaults of missing fields
            let json = serde_json::to_value(&opt)?;
            Ok((opt, json))
        }
    }
}
