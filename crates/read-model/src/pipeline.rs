//! Pipelines as plain data.

use document_store::{Collection, Filter};

use crate::aggregation::Group;
use crate::join::Lookup;
use crate::pagination::{PageRequest, SortSpec};
use crate::projection::{FieldSpec, Projection, Redaction};

/// One step of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Keeps documents matching the filter.
    Match(Filter),
    /// Attaches related documents.
    Lookup(Lookup),
    /// Emits one document per element of the array at the path; empty or
    /// missing arrays drop the document.
    Unwind(String),
    /// Adds computed fields, keeping everything else.
    AddFields(Vec<FieldSpec>),
    Project(Projection),
    Sort(SortSpec),
    Skip(u64),
    Limit(u64),
    Group(Group),
    /// Sorts, records the total count and cuts one page. Only valid in
    /// [`QueryEngine::run_paged`](crate::QueryEngine::run_paged).
    Paginate(SortSpec, PageRequest),
}

/// A query over one source collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub source: Collection,
    /// Pushed down to the store when loading the source.
    pub filter: Filter,
    pub stages: Vec<Stage>,
    /// Policy applied to every user document the pipeline touches.
    pub redaction: Redaction,
}

impl Pipeline {
    pub fn new(source: Collection) -> Self {
        Self {
            source,
            filter: Filter::new(),
            stages: Vec::new(),
            redaction: Redaction::Public,
        }
    }

    /// Narrows the source documents.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = self.filter.and(filter);
        self
    }

    pub fn redaction(mut self, redaction: Redaction) -> Self {
        self.redaction = redaction;
        self
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn matching(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn lookup(self, lookup: Lookup) -> Self {
        self.stage(Stage::Lookup(lookup))
    }

    pub fn unwind(self, path: impl Into<String>) -> Self {
        self.stage(Stage::Unwind(path.into()))
    }

    pub fn add_fields(self, fields: Vec<FieldSpec>) -> Self {
        self.stage(Stage::AddFields(fields))
    }

    pub fn project(self, projection: Projection) -> Self {
        self.stage(Stage::Project(projection))
    }

    pub fn sort(self, sort: SortSpec) -> Self {
        self.stage(Stage::Sort(sort))
    }

    pub fn skip(self, n: u64) -> Self {
        self.stage(Stage::Skip(n))
    }

    pub fn limit(self, n: u64) -> Self {
        self.stage(Stage::Limit(n))
    }

    pub fn group(self, group: Group) -> Self {
        self.stage(Stage::Group(group))
    }

    pub fn paginate(self, sort: SortSpec, request: PageRequest) -> Self {
        self.stage(Stage::Paginate(sort, request))
    }

    /// Number of `Paginate` stages at the top level.
    pub(crate) fn paginate_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|s| matches!(s, Stage::Paginate(..)))
            .count()
    }
}
