//! Moodle checkout and plugin model.
//!
//! Knows where a plugin lives inside Moodle (from the `component` declared in
//! its `version.php`) and what Moodle's `config.php` must contain for a CI
//! install.

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::config::ResolvedConfig;
use crate::error::{InstallError, Result};

/// A Moodle checkout on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Moodle {
    pub directory: PathBuf,
}

impl Moodle {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.directory.join("config.php")
    }

    /// Absolute install location of a plugin component inside this checkout
    pub fn component_install_directory(&self, component: &str) -> Result<PathBuf> {
        let (plugin_type, name) = split_component(component)?;
        let relative = plugin_type_directory(plugin_type).ok_or_else(|| {
            InstallError::config(format!(
                "unsupported plugin type '{}' in component '{}'",
                plugin_type, component
            ))
        })?;
        Ok(self.directory.join(relative).join(name))
    }
}

/// Plugin source tree, identified by its Frankenstyle component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodlePlugin {
    pub directory: PathBuf,
    pub component: String,
}

impl MoodlePlugin {
    /// Read the component from `<directory>/version.php`
    pub fn load(directory: &Path) -> Result<Self> {
        let version_file = directory.join("version.php");
        let contents = fs::read_to_string(&version_file).map_err(|e| {
            InstallError::config(format!(
                "cannot read {}: {}",
                version_file.display(),
                e
            ))
        })?;
        let component = parse_component(&contents).ok_or_else(|| {
            InstallError::config(format!(
                "no $plugin->component found in {}",
                version_file.display()
            ))
        })?;

        Ok(Self {
            directory: directory.to_path_buf(),
            component,
        })
    }
}

static COMPONENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\$plugin->component\s*=\s*['"]([a-z][a-z0-9_]*)['"]\s*;"#)
        .expect("valid component regex")
});

/// Extract `$plugin->component` from the contents of a version.php file
pub fn parse_component(version_php: &str) -> Option<String> {
    COMPONENT_RE
        .captures(version_php)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split `type_name`; a component without a type prefix is an activity module
fn split_component(component: &str) -> Result<(&str, &str)> {
    let (plugin_type, name) = match component.split_once('_') {
        Some((t, n)) => (t, n),
        None => ("mod", component),
    };
    if name.is_empty() {
        return Err(InstallError::config(format!(
            "invalid component name '{}'",
            component
        )));
    }
    Ok((plugin_type, name))
}

/// Directory, relative to the Moodle root, that holds plugins of a type
pub fn plugin_type_directory(plugin_type: &str) -> Option<&'static str> {
    let dir = match plugin_type {
        "mod" => "mod",
        "block" => "blocks",
        "local" => "local",
        "tool" => "admin/tool",
        "theme" => "theme",
        "auth" => "auth",
        "enrol" => "enrol",
        "filter" => "filter",
        "report" => "report",
        "format" => "course/format",
        "repository" => "repository",
        "portfolio" => "portfolio",
        "plagiarism" => "plagiarism",
        "qtype" => "question/type",
        "qbehaviour" => "question/behaviour",
        "qformat" => "question/format",
        "qbank" => "question/bank",
        "editor" => "lib/editor",
        "atto" => "lib/editor/atto/plugins",
        "tiny" => "lib/editor/tiny/plugins",
        "tinymce" => "lib/editor/tinymce/plugins",
        "gradeexport" => "grade/export",
        "gradeimport" => "grade/import",
        "gradereport" => "grade/report",
        "gradingform" => "grade/grading/form",
        "assignsubmission" => "mod/assign/submission",
        "assignfeedback" => "mod/assign/feedback",
        "quiz" => "mod/quiz/report",
        "quizaccess" => "mod/quiz/accessrule",
        "datafield" => "mod/data/field",
        "booktool" => "mod/book/tool",
        "ltisource" => "mod/lti/source",
        "workshopform" => "mod/workshop/form",
        "availability" => "availability/condition",
        "message" => "message/output",
        "dataformat" => "dataformat",
        "logstore" => "admin/tool/log/store",
        "mlbackend" => "lib/mlbackend",
        "customfield" => "customfield/field",
        "profilefield" => "user/profile/field",
        "cachestore" => "cache/stores",
        "fileconverter" => "files/converter",
        "media" => "media/player",
        "antivirus" => "lib/antivirus",
        "search" => "search/engine",
        "contenttype" => "contentbank/contenttype",
        "paygw" => "payment/gateway",
        "h5plib" => "h5p/h5plib",
        _ => return None,
    };
    Some(dir)
}

/// PHP single-quoted string literal
fn php_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Contents of Moodle's `config.php` for a CI install
pub fn config_php_contents(config: &ResolvedConfig) -> String {
    let dbport = config
        .db_port
        .map(|port| port.to_string())
        .unwrap_or_default();
    let phpunit_dataroot = config.data_dir.join("phpu_moodledata");

    format!(
        r#"<?php  // Moodle configuration file

unset($CFG);
global $CFG;
$CFG = new stdClass();

$CFG->dbtype    = {dbtype};
$CFG->dblibrary = 'native';
$CFG->dbhost    = {dbhost};
$CFG->dbname    = {dbname};
$CFG->dbuser    = {dbuser};
$CFG->dbpass    = {dbpass};
$CFG->prefix    = 'mdl_';
$CFG->dboptions = ['dbport' => {dbport}];

$CFG->wwwroot   = 'http://localhost/moodle';
$CFG->dataroot  = {dataroot};
$CFG->admin     = 'admin';
$CFG->directorypermissions = 02777;

$CFG->debug = (E_ALL | E_STRICT);
$CFG->debugdisplay = 1;
$CFG->debugstringids = 1;
$CFG->perfdebug = 15;
$CFG->debugpageinfo = 1;
$CFG->allowthemechangeonurl = 1;
$CFG->passwordpolicy = 0;
$CFG->cronclionly = 0;

$CFG->phpunit_dataroot = {phpunit_dataroot};
$CFG->phpunit_prefix   = 'phpu_';

require_once(__DIR__ . '/lib/setup.php');
"#,
        dbtype = php_string(&config.db_type.to_string()),
        dbhost = php_string(&config.db_host),
        dbname = php_string(&config.db_name),
        dbuser = php_string(&config.db_user),
        dbpass = php_string(&config.db_pass),
        dbport = php_string(&dbport),
        dataroot = php_string(&config.data_dir.display().to_string()),
        phpunit_dataroot = php_string(&phpunit_dataroot.display().to_string()),
    )
}
