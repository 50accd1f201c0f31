// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::TimeDelta;
use clap::Parser;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use contract_diff::temporal::parse_duration;
use contract_diff::{
    diff, diff_bodies, diff_headers, diff_with_control, header_list, normalize, Config,
    DiffResult, Expectation, NormalizeOptions, Report, Validator,
};

#[doc(hidden)]
#[macro_export]
macro_rules! handle_error {
    ($code:expr, $msg:expr, $($arg:tt)*) => {
        eprintln!($msg, $($arg)*);
        std::process::exit($code);
    };

    ($code:expr, $msg:expr) => {
        eprintln!($msg);
        std::process::exit($code);
    };
}

#[doc(hidden)]
#[derive(Debug, Clone, Copy)]
struct DurationArg(TimeDelta);

impl FromStr for DurationArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
            .map(DurationArg)
            .ok_or_else(|| format!("`{}` is not an ISO-8601 duration", s))
    }
}

#[doc(hidden)]
struct Code;

impl Code {
    const SUCCESS: i32 = 0;
    const INTERNAL_ERROR: i32 = 1;
    const INVALID_ARGUMENT: i32 = 2;
    const PARSING_ERROR: i32 = 3;
    const DIFFERENCE_FOUND: i32 = 4;
}

#[doc(hidden)]
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// JSON document under test
    candidate: PathBuf,

    /// JSON document the candidate must match
    reference: PathBuf,

    /// Second reference run; paths where it disagrees with the reference are ignored
    #[clap(short, long)]
    control: Option<PathBuf>,

    /// Path patterns to ignore, e.g. `$.items[*].id`
    #[clap(short, long)]
    ignore: Vec<String>,

    /// JSON object of the candidate's response headers
    #[clap(long, requires = "reference_headers")]
    candidate_headers: Option<PathBuf>,

    /// JSON object of the reference's response headers
    #[clap(long, requires = "candidate_headers")]
    reference_headers: Option<PathBuf>,

    /// Header names to ignore
    #[clap(long)]
    ignore_header: Vec<String>,

    /// Tolerance for floating numbers
    #[clap(short, long)]
    epsilon: Option<f64>,

    /// Tolerance for dates, date-times and durations, e.g. `PT1S`
    #[clap(long)]
    duration_epsilon: Option<DurationArg>,

    /// JSON file with a list of expectations checked against the candidate
    #[clap(short = 'x', long)]
    expectations: Option<PathBuf>,

    /// Report differences on ignored paths as white noise
    #[clap(short, long)]
    white_noise: bool,

    /// Expand dotted member names into nested objects before comparing
    #[clap(short, long)]
    normalize: bool,

    /// Print the result as JSON
    #[clap(long)]
    json: bool,
}

#[doc(hidden)]
fn read(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            handle_error!(Code::INVALID_ARGUMENT, "Error reading {}: {}", path.display(), err);
        }
    }
}

#[doc(hidden)]
fn parse(path: &Path, content: &str, normalized: bool) -> Value {
    match serde_json::from_str(content) {
        Ok(doc) if normalized => normalize(&doc, NormalizeOptions::default()),
        Ok(doc) => doc,
        Err(err) => {
            handle_error!(Code::PARSING_ERROR, "Error parsing {}: {}", path.display(), err);
        }
    }
}

#[doc(hidden)]
fn headers(path: &Path) -> Vec<(String, String)> {
    let parsed = serde_json::from_str::<Value>(&read(path))
        .map_err(|err| err.to_string())
        .and_then(|doc| {
            header_list(&doc).ok_or_else(|| "expected an object of header values".to_string())
        });
    match parsed {
        Ok(headers) => headers,
        Err(err) => {
            handle_error!(Code::PARSING_ERROR, "Error parsing {}: {}", path.display(), err);
        }
    }
}

#[doc(hidden)]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::new().report_white_noise(cli.white_noise);
    for pattern in &cli.ignore {
        let ignore = config.ignores().clone().pattern(pattern);
        match ignore {
            Ok(ignore) => config = config.ignore_set(ignore),
            Err(err) => {
                handle_error!(Code::INVALID_ARGUMENT, "Error: {}", err);
            }
        }
    }
    for header in cli.ignore_header {
        config = config.ignore_header(header);
    }
    if let Some(epsilon) = cli.epsilon {
        config = config.numeric_epsilon(epsilon);
    }
    if let Some(DurationArg(epsilon)) = cli.duration_epsilon {
        config = config.duration_epsilon(epsilon);
    }

    let expectations: Vec<Expectation> = match &cli.expectations {
        Some(path) => match serde_json::from_str(&read(path)) {
            Ok(expectations) => expectations,
            Err(err) => {
                handle_error!(Code::PARSING_ERROR, "Error parsing {}: {}", path.display(), err);
            }
        },
        None => vec![],
    };

    let candidate_body = read(&cli.candidate);
    let reference_body = read(&cli.reference);

    let plain = cli.control.is_none() && !cli.normalize && expectations.is_empty();
    let (mut result, confirmations) = if plain {
        (diff_bodies(&candidate_body, &reference_body, &config), vec![])
    } else {
        let candidate = parse(&cli.candidate, &candidate_body, cli.normalize);
        let reference = parse(&cli.reference, &reference_body, cli.normalize);

        let mut result = match &cli.control {
            Some(path) => {
                let control = parse(path, &read(path), cli.normalize);
                diff_with_control(&candidate, &reference, &control, &config)
            }
            None => diff(&candidate, &reference, &config),
        };

        let mut failures = DiffResult::new();
        let confirmations =
            Validator::new(&candidate, &config).check_all(&expectations, &mut failures);
        result.merge(failures);
        (result, confirmations)
    };

    if let (Some(candidate), Some(reference)) = (&cli.candidate_headers, &cli.reference_headers) {
        result.merge(diff_headers(&headers(candidate), &headers(reference), &config));
    }

    let report = Report::new(result, confirmations);

    if cli.json {
        let rendered = serde_json::to_string_pretty(&json!({
            "result": report.result(),
            "confirmations": report.confirmations(),
        }));
        match rendered {
            Ok(rendered) => println!("{}", rendered),
            Err(err) => {
                handle_error!(Code::INTERNAL_ERROR, "Error: {}", err);
            }
        }
    } else {
        println!("{}", report);
    }

    if report.passed() {
        std::process::exit(Code::SUCCESS);
    }
    std::process::exit(Code::DIFFERENCE_FOUND);
}
