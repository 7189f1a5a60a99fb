#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod config;
pub mod manifest;
pub mod package;
pub mod registry;
pub mod rewrite;
pub mod store;

pub use builder::{BuildFailure, BuildReport, BuiltPackage};
pub use config::PackagerConfig;
pub use manifest::PackageManifest;
pub use package::{AssetKind, PackageDefinition};
pub use registry::PackageRegistry;
pub use store::{AssetStore, DiskAssetStore, SourceFile};
