//! Postman collection generator - API collections from axios call sites.
//!
//! This library statically analyses JavaScript tool scripts, finds every
//! `axios.<method>(url, body?)` call whose URL is a string or template literal, and turns the
//! calls into a Postman v2.1 collection plus an environment template. Nothing is executed:
//! values that are not literals in the source become `{{NAME}}` placeholders.
//!
//! # Architecture
//!
//! 1. [`scanner`] - Selects numbered tool directories and collects source files
//! 2. [`parser`] - Parses source files into syntax trees
//! 3. [`extractor`] - Finds client call sites and builds request records
//! 4. [`literal`] - Rebuilds URLs and JSON bodies from literal expressions
//! 5. [`collection_builder`] - Orders records and builds the output documents
//! 6. [`serializer`] - Writes documents as canonical JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use postman_from_source::{
//!     collection_builder::CollectionBuilder,
//!     extractor::{axios::AxiosExtractor, CallSiteExtractor},
//!     parser::AstParser,
//!     scanner::FileScanner,
//!     serializer::to_canonical_json,
//! };
//! use std::path::PathBuf;
//!
//! let scan_result = FileScanner::new(PathBuf::from("./tools")).scan().unwrap();
//!
//! let parsed_files: Vec<_> = AstParser::parse_files(&scan_result.source_files)
//!     .into_iter()
//!     .filter_map(|r| r.ok())
//!     .collect();
//!
//! let records = AxiosExtractor::default().extract_calls(&parsed_files);
//!
//! let mut builder = CollectionBuilder::new();
//! builder.add_records(records);
//! let collection = builder.build_collection().unwrap();
//!
//! println!("{}", to_canonical_json(&collection).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides a complete CLI application.

pub mod cli;
pub mod collection_builder;
pub mod error;
pub mod extractor;
pub mod literal;
pub mod parser;
pub mod scanner;
pub mod serializer;
