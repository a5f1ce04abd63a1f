//! Bucket configuration and symbol-to-module assignment.
//!
//! Buckets are declared in order; the first bucket that lists an entity
//! owns it. Entities listed nowhere land in the default bucket. Aliases
//! follow the entity they derive from.

use crate::core::catalog::{Catalog, Symbol};
use crate::core::diag::Warning;
use crate::core::error::SplitError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_HEADER: &str = "import { int, mysqlEnum, mysqlTable, text, timestamp, varchar, decimal, boolean, json, bigint } from \"drizzle-orm/mysql-core\";";

/// Bucket layout and output naming, usually loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketConfig {
    /// Bucket for entities listed nowhere and for unresolved aliases.
    pub default_bucket: String,
    /// Output file extension, without the dot.
    pub extension: String,
    /// File stem of the aggregating re-export file.
    pub index_name: String,
    /// Carry `//` banner comments along with the entity below them.
    pub keep_leading_comments: bool,
    /// Shared import line placed at the top of every module file.
    pub header: String,
    #[serde(rename = "bucket")]
    pub buckets: Vec<BucketDef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketDef {
    pub name: String,
    #[serde(default)]
    pub entities: Vec<String>,
}

impl BucketDef {
    fn new(name: &str, entities: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            entities: entities.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            default_bucket: "assets".to_string(),
            extension: "ts".to_string(),
            index_name: "index".to_string(),
            keep_leading_comments: true,
            header: DEFAULT_HEADER.to_string(),
            buckets: vec![
                BucketDef::new(
                    "users",
                    &[
                        "users",
                        "verificationDocuments",
                        "trustScoreHistory",
                        "peerReviews",
                        "relationships",
                        "contactHandles",
                        "userFlags",
                        "notifications",
                    ],
                ),
                BucketDef::new(
                    "matching",
                    &[
                        "intents",
                        "matches",
                        "transactionCriteria",
                        "transactionMatches",
                        "verificationProofs",
                    ],
                ),
                BucketDef::new(
                    "deals",
                    &[
                        "deals",
                        "dealParticipants",
                        "dealRooms",
                        "dealRoomAccess",
                        "documents",
                        "documentSignatures",
                        "ndaTemplates",
                        "escrowAccounts",
                        "payouts",
                        "wireInstructions",
                        "spvs",
                        "capTableEntries",
                        "capitalCommitments",
                        "capitalCalls",
                        "capitalCallResponses",
                        "lpProfiles",
                    ],
                ),
                BucketDef::new(
                    "compliance",
                    &[
                        "complianceChecks",
                        "auditLog",
                        "auditLogs",
                        "complianceChecklists",
                    ],
                ),
            ],
        }
    }
}

fn is_file_stem(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

impl BucketConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml(text: &str) -> Result<Self, SplitError> {
        let config: BucketConfig =
            toml::from_str(text).map_err(|e| SplitError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to the built-in layout when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, SplitError> {
        match path {
            None => Ok(Self::default()),
            Some(p) => {
                let text = fs::read_to_string(p).map_err(|e| {
                    SplitError::ConfigError(format!("cannot read {}: {}", p.display(), e))
                })?;
                Self::from_toml(&text)
            }
        }
    }

    pub fn to_toml(&self) -> Result<String, SplitError> {
        toml::to_string(self).map_err(|e| SplitError::ConfigError(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), SplitError> {
        let ext = self.extension.trim_start_matches('.');
        if ext.is_empty() || !is_file_stem(ext) {
            return Err(SplitError::ConfigError(format!(
                "invalid extension `{}`",
                self.extension
            )));
        }
        for stem in [&self.default_bucket, &self.index_name] {
            if !is_file_stem(stem) {
                return Err(SplitError::ConfigError(format!(
                    "`{}` is not a usable file name",
                    stem
                )));
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for bucket in &self.buckets {
            if !is_file_stem(&bucket.name) {
                return Err(SplitError::ConfigError(format!(
                    "bucket name `{}` is not a usable file name",
                    bucket.name
                )));
            }
            if seen.contains(&bucket.name.as_str()) {
                return Err(SplitError::ConfigError(format!(
                    "bucket `{}` declared twice",
                    bucket.name
                )));
            }
            seen.push(&bucket.name);
        }

        if self.module_order().contains(&self.index_name) {
            return Err(SplitError::ConfigError(format!(
                "bucket `{}` collides with the index file name",
                self.index_name
            )));
        }
        Ok(())
    }

    /// Configured buckets in declaration order, then the default bucket if
    /// it was not configured explicitly.
    pub fn module_order(&self) -> Vec<String> {
        let mut order: Vec<String> = self.buckets.iter().map(|b| b.name.clone()).collect();
        if !order.contains(&self.default_bucket) {
            order.push(self.default_bucket.clone());
        }
        order
    }

    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

/// Owner module of every symbol in a catalog.
#[derive(Debug, Clone, Default)]
pub struct Assignment {
    owner: FxHashMap<String, String>,
}

impl Assignment {
    pub fn owner_of(&self, symbol: &str) -> Option<&str> {
        self.owner.get(symbol).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }
}

/// Map every catalog symbol to exactly one module.
pub fn assign(catalog: &Catalog, config: &BucketConfig) -> (Assignment, Vec<Warning>) {
    let mut warnings = Vec::new();

    let mut membership: FxHashMap<&str, &str> = FxHashMap::default();
    for bucket in &config.buckets {
        for entity in &bucket.entities {
            match membership.get(entity.as_str()).copied() {
                Some(kept) if kept != bucket.name => {
                    warnings.push(Warning::DuplicateBucketMember {
                        entity: entity.clone(),
                        kept: kept.to_string(),
                        ignored: bucket.name.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    membership.insert(entity.as_str(), bucket.name.as_str());
                    if catalog.entity(entity).is_none() {
                        warnings.push(Warning::UnknownBucketMember {
                            bucket: bucket.name.clone(),
                            entity: entity.clone(),
                        });
                    }
                }
            }
        }
    }

    let mut owner = FxHashMap::default();
    for entity in catalog.entities() {
        let bucket = membership
            .get(entity.name.as_str())
            .copied()
            .unwrap_or(config.default_bucket.as_str());
        owner.insert(entity.name.clone(), bucket.to_string());
    }

    for symbol in catalog.symbols() {
        let Symbol::Alias(alias) = symbol else {
            continue;
        };
        let bucket = match owner.get(&alias.referenced_entity) {
            Some(b) if alias.resolved => b.clone(),
            _ => {
                warnings.push(Warning::UnresolvedAliasReference {
                    alias: alias.name.clone(),
                    entity: alias.referenced_entity.clone(),
                    fallback: config.default_bucket.clone(),
                });
                config.default_bucket.clone()
            }
        };
        owner.insert(alias.name.clone(), bucket);
    }

    (Assignment { owner }, warnings)
}
