//! Tests for Installation Orchestration
//!
//! These tests verify:
//! - Pipeline shape for each combination of skip flags
//! - Step positions stay stable when steps are substituted
//! - Fail-fast execution through the public `Installer` trait
//! - Environment exported by the steps

use moodle_plugin_install::cli::InstallArgs;
use moodle_plugin_install::installer::StepKind;
use moodle_plugin_install::{
    ConfigDumper, ConfigResolver, DefaultInstall, Environment, Execute, Install, InstallError,
    InstallOutput, Installer, InstallerCollection, InstallerFactory, ProcessExecutor, Result,
};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

fn build(args: InstallArgs) -> InstallerCollection {
    let config = ConfigResolver::new(&Environment::default(), Path::new("/ci"))
        .resolve(&args)
        .expect("config should resolve");
    let factory = InstallerFactory::new(config, ConfigDumper::new()).expect("factory");
    let mut collection = InstallerCollection::new();
    factory.add_installers(&mut collection);
    collection
}

fn base_args() -> InstallArgs {
    InstallArgs {
        db_type: Some("pgsql".to_string()),
        ..Default::default()
    }
}

// =============================================================================
// Pipeline Shape Tests
// =============================================================================

#[test]
fn test_every_flag_combination_keeps_slot_positions() {
    for no_clone in [false, true] {
        for db_create_skip in [false, true] {
            for no_config_rewrite in [false, true] {
                let kinds = build(InstallArgs {
                    no_clone,
                    db_create_skip,
                    no_config_rewrite,
                    ..base_args()
                })
                .kinds();

                let expected_moodle = if no_clone {
                    StepKind::MoodleExisting
                } else {
                    StepKind::MoodleClone
                };
                let expected_plugin = if db_create_skip {
                    StepKind::PluginNoCopy
                } else {
                    StepKind::PluginCopy
                };
                let expected_config = if no_config_rewrite {
                    StepKind::ConfigRewriteNoOp
                } else {
                    StepKind::ConfigRewrite
                };

                assert_eq!(kinds[0], expected_moodle);
                assert_eq!(kinds[1], expected_plugin);
                assert_eq!(*kinds.last().unwrap(), expected_config);
                assert_eq!(
                    kinds.contains(&StepKind::DatabaseCreate),
                    !db_create_skip,
                    "database step present iff creating the database"
                );
                assert_eq!(kinds.len(), if db_create_skip { 3 } else { 4 });
            }
        }
    }
}

#[test]
fn test_no_duplicate_responsibilities() {
    let kinds = build(base_args()).kinds();
    let plugin_steps = kinds
        .iter()
        .filter(|k| matches!(k, StepKind::PluginCopy | StepKind::PluginNoCopy))
        .count();
    assert_eq!(plugin_steps, 1);
}

#[test]
fn test_step_descriptions_are_readable() {
    let collection = build(base_args());
    let descriptions: Vec<String> = collection.all().iter().map(|i| i.describe()).collect();
    assert_eq!(descriptions[0], "Clone Moodle (main)");
    assert_eq!(descriptions[2], "Create pgsql database");
}

// =============================================================================
// Execution Tests
// =============================================================================

struct CountingStep {
    kind: StepKind,
    runs: Rc<Cell<u32>>,
    fail: bool,
}

impl Installer for CountingStep {
    fn kind(&self) -> StepKind {
        self.kind
    }

    fn install(&self, _execute: &dyn Execute, output: &mut InstallOutput) -> Result<()> {
        self.runs.set(self.runs.get() + 1);
        output.info("counting step ran");
        if self.fail {
            return Err(InstallError::step(self.kind.to_string(), "simulated failure"));
        }
        Ok(())
    }

    fn env(&self) -> Vec<(String, String)> {
        vec![("LAST_STEP".to_string(), self.kind.to_string())]
    }
}

#[test]
fn test_fail_fast_stops_remaining_steps() {
    let runs = Rc::new(Cell::new(0));
    let mut collection = InstallerCollection::new();
    for (kind, fail) in [
        (StepKind::MoodleExisting, false),
        (StepKind::PluginNoCopy, true),
        (StepKind::ConfigRewriteNoOp, false),
    ] {
        collection.add(CountingStep {
            kind,
            runs: Rc::clone(&runs),
            fail,
        });
    }

    let err = DefaultInstall.run(&collection, &ProcessExecutor).unwrap_err();
    assert!(err.to_string().contains("plugin-no-copy"));
    assert_eq!(runs.get(), 2);
}

#[test]
fn test_progress_counts_each_step() {
    let runs = Rc::new(Cell::new(0));
    let mut collection = InstallerCollection::new();
    collection.add(CountingStep {
        kind: StepKind::MoodleExisting,
        runs: Rc::clone(&runs),
        fail: false,
    });
    collection.add(CountingStep {
        kind: StepKind::ConfigRewriteNoOp,
        runs: Rc::clone(&runs),
        fail: false,
    });

    let mut output = InstallOutput::new();
    collection.install(&ProcessExecutor, &mut output).unwrap();
    assert_eq!(output.completed(), 2);
    assert_eq!(collection.merged_env()["LAST_STEP"], "config-rewrite-no-op");
}
