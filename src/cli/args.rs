//! Command-line argument parsing for spectrum-bridge
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::enrichment::{Personalization, ReadingLevel, TaskName};
use crate::scheduler::ProcessRequest;

/// spectrum-bridge - grounded, child-friendly answers from a knowledge base
#[derive(Parser, Debug)]
#[command(name = "spectrum-bridge")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(about = "Answer questions from a vector knowledge base with simplified text, stories and images", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except final result)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline for one question
    Ask {
        /// Question to answer
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Also write a social story
        #[arg(long)]
        story: bool,

        /// Also generate an illustration
        #[arg(long)]
        image: bool,

        /// Name used in the social story
        #[arg(long)]
        child_name: Option<String>,

        /// Story reading level (grade_2, grade_3, grade_4)
        #[arg(long, default_value = "grade_2")]
        reading_level: ReadingLevel,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Write a Markdown report to this path
        #[arg(long, value_name = "PATH")]
        markdown_out: Option<PathBuf>,

        /// Attempts when retrieval is unavailable
        #[arg(long, default_value_t = 1)]
        retries: u32,
    },

    /// Search the knowledge base without enrichment
    Search {
        /// Query text, or a source id with --by-source
        #[arg(value_name = "QUERY")]
        query: String,

        /// Number of passages (defaults to config)
        #[arg(long)]
        top_k: Option<usize>,

        /// Minimum relevance score (defaults to config)
        #[arg(long)]
        min_score: Option<f32>,

        /// Treat QUERY as a source id and list its chunks
        #[arg(long)]
        by_source: bool,
    },

    /// Show knowledge base statistics
    Stats,

    /// Write a default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Commands {
    /// Build the pipeline request for `ask`
    pub fn to_request(&self) -> Option<ProcessRequest> {
        match self {
            Commands::Ask {
                question,
                story,
                image,
                child_name,
                reading_level,
                ..
            } => {
                let mut request = ProcessRequest::new(question.clone());
                if *story {
                    request = request.with_task(TaskName::Story);
                }
                if *image {
                    request = request.with_task(TaskName::Image);
                }
                if child_name.is_some() || *reading_level != ReadingLevel::default() {
                    request = request.with_personalization(Personalization {
                        child_name: child_name.clone(),
                        reading_level: *reading_level,
                    });
                }
                Some(request)
            }
            _ => None,
        }
    }
}

impl Verbosity {
    /// Log level this verbosity maps to, if it overrides the configured one
    pub fn log_level(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("debug"),
            Verbosity::VeryVerbose => Some("trace"),
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(parse(&["sb", "stats"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["sb", "-q", "stats"]).verbosity(), Verbosity::Quiet);
        assert_eq!(parse(&["sb", "stats", "-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["sb", "-vv", "stats"]).verbosity(), Verbosity::VeryVerbose);
        assert_eq!(Verbosity::Verbose.log_level(), Some("debug"));
        assert!(!Verbosity::Quiet.show_progress());
    }

    #[test]
    fn test_ask_builds_request() {
        let args = parse(&[
            "sb",
            "ask",
            "Going to the doctor",
            "--story",
            "--child-name",
            "Ava",
            "--reading-level",
            "grade_3",
        ]);

        let request = args.command.to_request().unwrap();
        assert_eq!(request.question, "Going to the doctor");
        assert!(request.task_selection.contains(&TaskName::Story));
        assert!(!request.task_selection.contains(&TaskName::Image));
        let personalization = request.personalization.unwrap();
        assert_eq!(personalization.child_name.as_deref(), Some("Ava"));
        assert_eq!(personalization.reading_level, ReadingLevel::Grade3);
    }

    #[test]
    fn test_ask_defaults() {
        let args = parse(&["sb", "ask", "What causes early regression?"]);
        let request = args.command.to_request().unwrap();
        assert!(request.task_selection.is_empty());
        assert!(request.personalization.is_none());

        if let Commands::Ask { retries, json, .. } = args.command {
            assert_eq!(retries, 1);
            assert!(!json);
        }
    }

    #[test]
    fn test_search_options() {
        let args = parse(&["sb", "search", "sensory", "--top-k", "3", "--min-score", "0.4"]);
        match args.command {
            Commands::Search { query, top_k, min_score, by_source } => {
                assert_eq!(query, "sensory");
                assert_eq!(top_k, Some(3));
                assert_eq!(min_score, Some(0.4));
                assert!(!by_source);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert!(parse(&["sb", "stats"]).command.to_request().is_none());
    }

    #[test]
    fn test_bad_reading_level_rejected() {
        assert!(Args::try_parse_from(["sb", "ask", "q", "--reading-level", "college"]).is_err());
    }
}
