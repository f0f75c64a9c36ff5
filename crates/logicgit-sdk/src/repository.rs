use std::fs;
use std::path::{Path, PathBuf};

use logicgit_diff::{diff_executions, DiffReport};
use logicgit_engine::{Execution, RuleEngine, RuleSet};
use logicgit_index::{
    AuditRecord, ExecutionBundle, ExecutionIndex, ExecutionRecord, InMemoryIndex, SnapshotKind,
    SnapshotRecord, SqliteIndex,
};
use logicgit_refs::{BranchInfo, FsRefStore, InMemoryRefStore, RefStore};
use logicgit_store::{DualObjectStore, FsBlobArea, InMemoryObjectStore, ObjectStore, StoreError};
use logicgit_types::{Commit, ContentHash, ObjectKind, Record};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::RepoConfig;
use crate::error::{CommitStage, RepoError, RepoResult};
use crate::export::ExportDocument;
use crate::history::{CommitOutcome, ExecutionDetail, LogEntry};
use crate::loader::{load_records, load_rules, resolve_input};

/// Name of the metadata directory at the repository root.
pub const META_DIR: &str = ".logicgit";

/// Branch label stored with executions committed on a detached HEAD.
const DETACHED: &str = "(detached)";

/// A repository persisted under `<root>/.logicgit`.
pub type DiskRepository = Repository<DualObjectStore<SqliteIndex, FsBlobArea>, SqliteIndex, FsRefStore>;

/// A repository that keeps everything in memory.
pub type MemoryRepository =
    Repository<DualObjectStore<InMemoryIndex, InMemoryObjectStore>, InMemoryIndex, InMemoryRefStore>;

/// One repository session.
///
/// The session pins the branch HEAD named when it was opened (or last
/// checked out); commits advance that branch, or HEAD itself when detached.
/// Writes take `&mut self`, so one session is the single writer for its
/// repository.
pub struct Repository<S, I, R> {
    root: PathBuf,
    config: RepoConfig,
    objects: S,
    index: I,
    refs: R,
    engine: RuleEngine,
    branch: Option<String>,
}

impl<S, I, R> std::fmt::Debug for Repository<S, I, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

impl DiskRepository {
    /// Create (or re-open) a repository at `root`.
    ///
    /// Creates `.logicgit/` with an object area, an index database, refs,
    /// and a default config, plus the rules, data, and exports working
    /// directories. Running it on an existing repository changes nothing.
    pub fn init(root: impl AsRef<Path>) -> RepoResult<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join(META_DIR);
        fs::create_dir_all(meta.join("objects"))?;

        let config_path = meta.join("config.toml");
        let config = RepoConfig::load(&config_path)?;
        if !config_path.exists() {
            config.save(&config_path)?;
        }
        for dir in [&config.paths.rules_dir, &config.paths.data_dir, &config.paths.exports_dir] {
            fs::create_dir_all(root.join(dir))?;
        }
        FsRefStore::init(&meta, &config.core.default_branch)?;

        info!(root = %root.display(), branch = %config.core.default_branch, "initialized repository");
        Self::open(root)
    }

    /// Open an existing repository at `root`.
    pub fn open(root: impl AsRef<Path>) -> RepoResult<Self> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join(META_DIR);
        if !meta.join("HEAD").is_file() {
            return Err(RepoError::NotARepository(root.display().to_string()));
        }
        let config = RepoConfig::load(&meta.join("config.toml"))?;
        let index = SqliteIndex::open(meta.join("index.db"))?;
        let blobs = FsBlobArea::open(meta.join("objects"))?;
        let objects = DualObjectStore::new(index.clone(), blobs);
        debug!(root = %root.display(), "opened repository");
        Repository::from_parts(root, config, objects, index, FsRefStore::open(meta))
    }

    /// Set a config key and write the config file back.
    pub fn set_config(&mut self, key: &str, value: &str) -> RepoResult<()> {
        self.config.set(key, value)?;
        self.config.save(&self.root.join(META_DIR).join("config.toml"))
    }
}

impl MemoryRepository {
    /// An in-memory repository with one empty default branch. `root` only
    /// anchors the rules, data, and exports directories.
    pub fn in_memory(root: impl Into<PathBuf>) -> RepoResult<Self> {
        let config = RepoConfig::default();
        let index = InMemoryIndex::new();
        let objects = DualObjectStore::new(index.clone(), InMemoryObjectStore::new());
        let refs = InMemoryRefStore::with_default_branch(&config.core.default_branch)?;
        Repository::from_parts(root, config, objects, index, refs)
    }
}

impl<S, I, R> Repository<S, I, R>
where
    S: ObjectStore,
    I: ExecutionIndex,
    R: RefStore,
{
    /// Assemble a repository from its parts. The session branch is whatever
    /// HEAD names right now.
    pub fn from_parts(
        root: impl Into<PathBuf>,
        config: RepoConfig,
        objects: S,
        index: I,
        refs: R,
    ) -> RepoResult<Self> {
        let branch = refs.current_branch()?;
        Ok(Self {
            root: root.into(),
            config,
            objects,
            index,
            refs,
            engine: RuleEngine::new(),
            branch,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    pub fn objects(&self) -> &S {
        &self.objects
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn refs(&self) -> &R {
        &self.refs
    }

    /// The session branch, `None` when HEAD is detached.
    pub fn current_branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn rules_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.rules_dir)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.data_dir)
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.exports_dir)
    }

    /// The commit new work would build on.
    pub fn head(&self) -> RepoResult<Option<ContentHash>> {
        Ok(match &self.branch {
            Some(branch) => self.refs.read_branch(branch)?,
            None => self.refs.resolve_head()?,
        })
    }

    // ---- Execution ----

    /// Run `rules` over `record` without persisting anything.
    pub fn execute(&self, rules: &RuleSet, record: &Record) -> RepoResult<Execution> {
        Ok(self.engine.execute(rules, record)?)
    }

    /// Persist `execution` as a new commit and advance the session branch.
    ///
    /// The parent is `parent` if given, else the current head. Artifacts
    /// are written in a fixed order: the commit object, the final-state
    /// object, the index rows, then the ref. A failure stops the sequence
    /// and is reported as [`RepoError::CommitIncomplete`] naming the stage,
    /// so the caller knows exactly what was left behind.
    pub fn commit(
        &mut self,
        execution: &Execution,
        message: &str,
        parent: Option<ContentHash>,
    ) -> RepoResult<ContentHash> {
        let parent = match parent {
            Some(parent) => Some(parent),
            None => self.head()?,
        };
        let commit = Commit::new(execution.execution_hash, parent, &self.config.user.author, message);

        let commit_hash = self
            .objects
            .put_value(ObjectKind::Commit, &commit)
            .map_err(|e| incomplete(CommitStage::CommitObject, None, e.into()))?;
        let state_hash = self
            .objects
            .put_value(ObjectKind::State, &execution.final_state)
            .map_err(|e| incomplete(CommitStage::StateObject, Some(commit_hash), e.into()))?;

        let bundle = self.bundle(execution, &commit, commit_hash, state_hash);
        self.index
            .record(&bundle)
            .map_err(|e| incomplete(CommitStage::Index, Some(commit_hash), e.into()))?;

        self.advance(commit_hash)
            .map_err(|e| incomplete(CommitStage::Ref, Some(commit_hash), e))?;

        info!(
            commit = %commit_hash.short_hex(),
            execution = %execution.execution_hash.short_hex(),
            branch = self.branch.as_deref().unwrap_or(DETACHED),
            applied = execution.applied_rules.len(),
            "committed execution"
        );
        Ok(commit_hash)
    }

    /// Execute and commit in one step.
    pub fn execute_and_commit(
        &mut self,
        rules: &RuleSet,
        record: &Record,
        source: &str,
        message: &str,
    ) -> RepoResult<CommitOutcome> {
        let execution = self.execute(rules, record)?.with_source(source);
        let commit_hash = self.commit(&execution, message, None)?;
        Ok(CommitOutcome {
            commit_hash,
            execution,
        })
    }

    /// Load a rules file and a data file, then execute and commit once per
    /// record, in file order.
    ///
    /// Relative paths that don't exist as given are looked up under the
    /// configured rules and data directories. Both files are loaded before
    /// anything runs, so a bad file commits nothing. Without `message`, each
    /// commit is described as `Execute <rules file> on record <n>`.
    pub fn execute_files(
        &mut self,
        rules_path: &Path,
        data_path: &Path,
        message: Option<&str>,
    ) -> RepoResult<Vec<CommitOutcome>> {
        let rules_path = resolve_input(rules_path, &self.rules_dir(), "rules file")?;
        let data_path = resolve_input(data_path, &self.data_dir(), "data file")?;
        let rules = load_rules(&rules_path)?;
        let records = load_records(&data_path)?;

        let source = rules_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| rules_path.display().to_string());

        let mut outcomes = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            let message = match message {
                Some(message) => message.to_string(),
                None => format!("Execute {source} on record {}", i + 1),
            };
            outcomes.push(self.execute_and_commit(&rules, record, &source, &message)?);
        }
        Ok(outcomes)
    }

    fn bundle(
        &self,
        execution: &Execution,
        commit: &Commit,
        commit_hash: ContentHash,
        state_hash: ContentHash,
    ) -> ExecutionBundle {
        let execution_hash = execution.execution_hash;
        let audit = execution
            .audit_trail
            .iter()
            .enumerate()
            .map(|(position, entry)| AuditRecord {
                execution_hash,
                position: u32::try_from(position).unwrap_or(u32::MAX),
                rule_name: entry.rule_name.clone(),
                condition_text: entry.condition_text.clone(),
                changes: Value::Object(entry.changes.clone()),
                state_before: entry.state_before.clone(),
                state_after: entry.state_after.clone(),
                timestamp: entry.timestamp,
            })
            .collect();

        ExecutionBundle {
            execution: ExecutionRecord {
                seq: 0,
                execution_hash,
                commit_hash,
                parent_hash: commit.parent,
                rules_source: execution.rules_source.clone(),
                rules_hash: execution.rules_hash,
                input_hash: execution.input_hash,
                output_hash: execution.output_hash,
                applied_rules: execution.applied_rules.clone(),
                duration_us: execution.duration_us,
                branch: self.branch.clone().unwrap_or_else(|| DETACHED.to_string()),
                message: commit.message.clone(),
                author: commit.author.clone(),
                timestamp: commit.timestamp,
            },
            audit,
            snapshot: SnapshotRecord {
                execution_hash,
                kind: SnapshotKind::Final,
                state: execution.final_state.clone(),
                state_hash,
                timestamp: commit.timestamp,
            },
        }
    }

    fn advance(&self, commit: ContentHash) -> RepoResult<()> {
        match &self.branch {
            Some(branch) => self.refs.write_branch(branch, Some(commit))?,
            None => self.refs.set_head_detached(commit)?,
        }
        Ok(())
    }

    // ---- History ----

    /// Commits made on a branch, newest first.
    ///
    /// Walks parent links from the branch tip and stops at the first commit
    /// recorded on another branch, so history inherited from the branch
    /// point is left out. `branch` defaults to the session branch (or HEAD
    /// when detached) and `limit` to `log.limit` from the config. A branch
    /// with no commits of its own yields an empty list.
    pub fn log(&self, branch: Option<&str>, limit: Option<usize>) -> RepoResult<Vec<LogEntry>> {
        let limit = limit.unwrap_or(self.config.log.limit);
        let (name, mut next) = match branch.or(self.branch.as_deref()) {
            Some(name) => (name, self.refs.read_branch(name)?),
            None => (DETACHED, self.refs.resolve_head()?),
        };

        let mut entries = Vec::new();
        while let Some(commit_hash) = next {
            if entries.len() >= limit {
                break;
            }
            let execution = self.index.execution_for_commit(&commit_hash)?;
            if execution.as_ref().is_some_and(|e| e.branch != name) {
                break;
            }
            let commit = self.read_commit(&commit_hash)?;
            next = commit.parent;
            entries.push(LogEntry {
                commit_hash,
                commit,
                execution,
            });
        }
        Ok(entries)
    }

    fn read_commit(&self, hash: &ContentHash) -> RepoResult<Commit> {
        let object = self.objects.get(hash)?;
        if object.kind != ObjectKind::Commit {
            return Err(StoreError::CorruptObject {
                hash: *hash,
                reason: format!("expected a commit, found {}", object.kind.as_str()),
            }
            .into());
        }
        Ok(object.decode()?)
    }

    /// Find the execution whose execution or commit hash starts with
    /// `prefix`. When several match, the most recently recorded one wins.
    pub fn resolve(&self, prefix: &str) -> RepoResult<ExecutionRecord> {
        let mut matches = self.index.find_by_prefix(prefix)?;
        if matches.is_empty() {
            return Err(RepoError::not_found("execution", prefix));
        }
        if matches.len() > 1 {
            warn!(
                prefix,
                matches = matches.len(),
                chosen = %matches[0].commit_hash.short_hex(),
                "ambiguous prefix, using the most recent match"
            );
        }
        Ok(matches.swap_remove(0))
    }

    /// Everything stored for one execution.
    pub fn show(&self, prefix: &str) -> RepoResult<ExecutionDetail> {
        let execution = self.resolve(prefix)?;
        let audit_trail = self.index.audit_trail(&execution.execution_hash)?;
        let final_state = self
            .index
            .snapshot(&execution.execution_hash, SnapshotKind::Final)?
            .map(|snapshot| snapshot.state);
        Ok(ExecutionDetail {
            execution,
            audit_trail,
            final_state,
        })
    }

    /// Compare two executions; the final-state diff is included when both
    /// snapshots exist.
    pub fn diff(&self, from: &str, to: &str) -> RepoResult<DiffReport> {
        let from = self.show(from)?;
        let to = self.show(to)?;
        let report = diff_executions(&from.execution, &to.execution);
        Ok(match (&from.final_state, &to.final_state) {
            (Some(a), Some(b)) => report.with_states(a, b),
            _ => report,
        })
    }

    /// Write one execution as pretty-printed JSON and return the file path.
    /// Without `output` the file lands in the exports directory.
    pub fn export(&self, prefix: &str, output: Option<&Path>) -> RepoResult<PathBuf> {
        let detail = self.show(prefix)?;
        let document = ExportDocument::new(detail.execution, detail.audit_trail, detail.final_state);
        let path = match output {
            Some(path) => path.to_path_buf(),
            None => self.exports_dir().join(document.file_name()),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&document).map_err(|e| RepoError::Serialization(e.to_string()))?;
        fs::write(&path, json)?;
        info!(path = %path.display(), execution = %document.execution.execution_hash.short_hex(), "exported execution");
        Ok(path)
    }

    // ---- Branches ----

    /// Create a branch at the current head. HEAD does not move.
    pub fn create_branch(&self, name: &str) -> RepoResult<Option<ContentHash>> {
        let tip = self.refs.create_branch(name)?;
        info!(branch = name, tip = ?tip.map(|h| h.short_hex()), "created branch");
        Ok(tip)
    }

    pub fn branches(&self) -> RepoResult<Vec<BranchInfo>> {
        Ok(self.refs.branches()?)
    }

    /// Point HEAD (and this session) at an existing branch.
    pub fn checkout(&mut self, name: &str) -> RepoResult<()> {
        self.refs.checkout(name)?;
        self.branch = Some(name.to_string());
        info!(branch = name, "switched branch");
        Ok(())
    }
}

fn incomplete(stage: CommitStage, commit: Option<ContentHash>, source: RepoError) -> RepoError {
    warn!(%stage, commit = ?commit.map(|h| h.short_hex()), error = %source, "commit stopped partway");
    RepoError::CommitIncomplete {
        stage,
        commit,
        source: Box::new(source),
    }
}
