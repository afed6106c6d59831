use std::path::PathBuf;

/// Options parsed from command line arguments
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub watch_data: bool,
    pub grants: Vec<String>,
    pub data_path: Option<PathBuf>,
}

impl CliOptions {
    /// Parse command line arguments
    /// Format: activity-view [options] -- <data.json>
    /// Options:
    ///   -w                Reload the data file when it changes
    ///   --grant <feature> Grant an additional feature key
    pub fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(&args)
    }

    /// Parse from a given argument list
    pub fn parse(args: &[String]) -> Self {
        let separator_pos = args.iter().position(|arg| arg == "--");
        let start = 1.min(args.len());
        let end = separator_pos.unwrap_or(args.len()).max(start);
        let opts = &args[start..end];

        let watch_data = opts.iter().any(|arg| arg == "-w");
        let grants = opts
            .windows(2)
            .filter(|pair| pair[0] == "--grant")
            .map(|pair| pair[1].clone())
            .collect();

        let data_path = match separator_pos {
            Some(pos) if pos + 1 < args.len() => Some(PathBuf::from(&args[pos + 1])),
            _ => {
                tracing::warn!(
                    "No data file specified. Usage: activity-view [options] -- <data.json>"
                );
                None
            }
        };

        tracing::info!(
            "Parsed CLI options: data={data_path:?}, watch={watch_data}, grants={grants:?}"
        );

        Self {
            watch_data,
            grants,
            data_path,
        }
    }
}
