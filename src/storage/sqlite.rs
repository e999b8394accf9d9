//! SQLite storage backend

use super::cache::ThingCache;
use super::ids::{next_free, IdSequence};
use super::traits::{
    BundleConfiguration, ChildClass, ClassHierarchyEntry, ClassHierarchyRepository,
    ClassRepository, ClassSubclassRelation, LiteralRepository, OpenStore, Page, PageRequest,
    PredicateRepository, PublishedContent, PublishedContentRepository, ResourceFilter,
    ResourceRepository, SearchString, Sort, SortDirection, SortProperty, StatementFilter,
    StatementRepository, StorageError, StorageResult, ThingRepository,
};
use crate::graph::{
    vocab::classes, Class, ContributorId, ExtractionMethod, Literal, ObservatoryId,
    OrganizationId, Predicate, Resource, Statement, StatementId, Thing, ThingId, ThingKind,
    Visibility,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const THING_COLUMNS: &str = "t.id, t.kind, t.label, t.datatype, t.uri, t.created_by, t.created_at, \
     t.observatory_id, t.organization_id, t.extraction_method, t.visibility, t.verified, \
     t.unlisted_by, t.modifiable, t.version";

const STATEMENT_COLUMNS: &str = "s.id, s.subject_id, s.predicate_id, s.object_id, s.created_by, \
     s.created_at, s.stmt_index, s.modifiable";

/// Descendant closure of the class bound to the first parameter of the subquery
const SUBCLASS_CLOSURE: &str = "WITH RECURSIVE sub(id) AS (SELECT ? UNION \
     SELECT h.child_id FROM subclass_of h JOIN sub ON h.parent_id = sub.id) SELECT id FROM sub";

/// SQLite-backed statement graph
///
/// Things of every kind share one table (ids are globally unique), class
/// membership of resources lives in `instance_of` and the subclass forest in
/// `subclass_of`. Thread-safe via internal mutex on the connection; reads go
/// through the injected [`ThingCache`], writes evict from it before returning.
pub struct SqliteGraph {
    conn: Mutex<Connection>,
    cache: Arc<ThingCache>,
}

type SqlParams = Vec<Box<dyn ToSql>>;

impl SqliteGraph {
    /// Replace the default cache, e.g. to share it or to disable caching
    pub fn with_cache(mut self, cache: Arc<ThingCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &ThingCache {
        &self.cache
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn from_connection(conn: Connection) -> StorageResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            cache: Arc::new(ThingCache::default()),
        })
    }

    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS things (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                label TEXT NOT NULL,
                datatype TEXT,
                uri TEXT,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                observatory_id TEXT,
                organization_id TEXT,
                extraction_method TEXT,
                visibility TEXT,
                verified INTEGER NOT NULL DEFAULT 0,
                unlisted_by TEXT,
                modifiable INTEGER NOT NULL DEFAULT 1,
                version INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_things_kind ON things(kind, created_at);
            CREATE INDEX IF NOT EXISTS idx_things_label ON things(kind, label);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_things_uri ON things(uri) WHERE uri IS NOT NULL;

            CREATE TABLE IF NOT EXISTS instance_of (
                resource_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                PRIMARY KEY (resource_id, class_id),
                FOREIGN KEY (resource_id) REFERENCES things(id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_instance_of_class ON instance_of(class_id);

            CREATE TABLE IF NOT EXISTS statements (
                id TEXT PRIMARY KEY,
                subject_id TEXT NOT NULL REFERENCES things(id),
                predicate_id TEXT NOT NULL REFERENCES things(id),
                object_id TEXT NOT NULL REFERENCES things(id),
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                stmt_index INTEGER,
                modifiable INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_statements_subject ON statements(subject_id, predicate_id);
            CREATE INDEX IF NOT EXISTS idx_statements_object ON statements(object_id, predicate_id);
            CREATE INDEX IF NOT EXISTS idx_statements_predicate ON statements(predicate_id);

            CREATE TABLE IF NOT EXISTS subclass_of (
                child_id TEXT PRIMARY KEY REFERENCES things(id),
                parent_id TEXT NOT NULL REFERENCES things(id),
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_subclass_parent ON subclass_of(parent_id);

            CREATE TABLE IF NOT EXISTS id_counters (
                sequence TEXT PRIMARY KEY,
                value INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS published_contents (
                id TEXT PRIMARY KEY,
                root_id TEXT NOT NULL,
                subgraph_json TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn next_id(&self, sequence: IdSequence) -> StorageResult<String> {
        let conn = self.conn();
        next_free(
            || {
                let value: i64 = conn.query_row(
                    "INSERT INTO id_counters (sequence, value) VALUES (?1, 1)
                     ON CONFLICT(sequence) DO UPDATE SET value = value + 1
                     RETURNING value",
                    params![sequence.name()],
                    |row| row.get(0),
                )?;
                Ok(sequence.format(value as u64))
            },
            |candidate| match sequence {
                IdSequence::Statement => statement_exists(&conn, candidate),
                _ => thing_exists(&conn, candidate),
            },
        )
    }

    fn save_simple_thing(&self, thing: &Thing) -> StorageResult<()> {
        let (datatype, uri, created_at, modifiable) = match thing {
            Thing::Literal(l) => (Some(l.datatype.as_str()), None, l.created_at, l.modifiable),
            Thing::Predicate(p) => (None, None, p.created_at, p.modifiable),
            Thing::Class(c) => (None, c.uri.as_deref(), c.created_at, c.modifiable),
            Thing::Resource(_) => {
                return Err(StorageError::Corrupt("resources are saved with version checks".into()))
            }
        };
        let changed = self.conn().execute(
            "INSERT INTO things (id, kind, label, datatype, uri, created_by, created_at, modifiable)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                label = excluded.label,
                datatype = excluded.datatype,
                uri = excluded.uri,
                modifiable = excluded.modifiable
             WHERE things.kind = excluded.kind",
            params![
                thing.id().as_str(),
                thing.kind().as_str(),
                thing.label(),
                datatype,
                uri,
                thing.created_by().to_string(),
                timestamp(&created_at),
                modifiable,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::Corrupt(format!(
                "\"{}\" already exists with a different kind",
                thing.id()
            )));
        }
        self.cache.evict(thing.kind(), thing.id());
        Ok(())
    }

    fn load_kind(&self, id: &ThingId, kind: ThingKind) -> StorageResult<Option<Thing>> {
        let thing = load_thing(&self.conn(), id)?;
        Ok(thing.filter(|t| t.kind() == kind))
    }

    fn kind_exists(&self, id: &ThingId, kind: ThingKind) -> StorageResult<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM things WHERE id = ?1 AND kind = ?2)",
            params![id.as_str(), kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Delete a thing of the given kind together with the statements it is the subject of
    fn delete_thing(&self, id: &ThingId, kind: ThingKind) -> StorageResult<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let outgoing: BTreeSet<StatementId> = {
            let mut stmt = tx.prepare("SELECT id FROM statements WHERE subject_id = ?1")?;
            let ids = stmt
                .query_map(params![id.as_str()], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids.into_iter().map(StatementId::new).collect()
        };
        let orphans = delete_statements_in(&tx, &outgoing)?;
        let deleted = tx.execute(
            "DELETE FROM things WHERE id = ?1 AND kind = ?2",
            params![id.as_str(), kind.as_str()],
        )?;
        tx.commit()?;
        drop(conn);

        self.cache.evict(kind, id);
        for literal in orphans {
            self.cache.evict(ThingKind::Literal, &literal);
        }
        Ok(deleted > 0)
    }

    fn find_labeled(
        &self,
        kind: ThingKind,
        label: Option<&SearchString>,
        page: &PageRequest,
    ) -> StorageResult<Page<Thing>> {
        let mut conditions = vec!["t.kind = ?".to_string()];
        let mut values: SqlParams = vec![Box::new(kind.as_str())];
        push_label_conditions(label, &mut conditions, &mut values);
        let conn = self.conn();
        query_things(&conn, &conditions, values, label, page)
    }
}

impl OpenStore for SqliteGraph {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::from_connection(conn)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

// === Row mapping ===

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(format!("{}: {}", s, e)))
}

fn parse_contributor(s: &str) -> StorageResult<ContributorId> {
    ContributorId::parse(s).ok_or_else(|| StorageError::Corrupt(format!("invalid contributor id \"{}\"", s)))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

struct ThingRow {
    id: String,
    kind: String,
    label: String,
    datatype: Option<String>,
    uri: Option<String>,
    created_by: String,
    created_at: String,
    observatory_id: Option<String>,
    organization_id: Option<String>,
    extraction_method: Option<String>,
    visibility: Option<String>,
    verified: bool,
    unlisted_by: Option<String>,
    modifiable: bool,
    version: i64,
}

impl ThingRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            label: row.get(2)?,
            datatype: row.get(3)?,
            uri: row.get(4)?,
            created_by: row.get(5)?,
            created_at: row.get(6)?,
            observatory_id: row.get(7)?,
            organization_id: row.get(8)?,
            extraction_method: row.get(9)?,
            visibility: row.get(10)?,
            verified: row.get(11)?,
            unlisted_by: row.get(12)?,
            modifiable: row.get(13)?,
            version: row.get(14)?,
        })
    }

    fn into_thing(self, conn: &Connection) -> StorageResult<Thing> {
        let kind = ThingKind::parse(&self.kind)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown thing kind \"{}\"", self.kind)))?;
        let id = ThingId::new(self.id);
        let created_by = parse_contributor(&self.created_by)?;
        let created_at = parse_timestamp(&self.created_at)?;
        let thing = match kind {
            ThingKind::Resource => {
                let classes = load_classes(conn, &id)?;
                Thing::Resource(Resource {
                    classes,
                    label: self.label,
                    created_by,
                    created_at,
                    observatory_id: self
                        .observatory_id
                        .as_deref()
                        .and_then(ObservatoryId::parse)
                        .unwrap_or_default(),
                    organization_id: self
                        .organization_id
                        .as_deref()
                        .and_then(OrganizationId::parse)
                        .unwrap_or_default(),
                    extraction_method: self
                        .extraction_method
                        .as_deref()
                        .and_then(ExtractionMethod::parse)
                        .unwrap_or_default(),
                    visibility: self
                        .visibility
                        .as_deref()
                        .and_then(Visibility::parse)
                        .unwrap_or_default(),
                    verified: self.verified,
                    unlisted_by: self.unlisted_by.as_deref().and_then(ContributorId::parse),
                    modifiable: self.modifiable,
                    version: self.version,
                    id,
                })
            }
            ThingKind::Literal => Thing::Literal(Literal {
                id,
                label: self.label,
                datatype: self.datatype.unwrap_or_else(|| "xsd:string".to_string()),
                created_by,
                created_at,
                modifiable: self.modifiable,
            }),
            ThingKind::Predicate => Thing::Predicate(Predicate {
                id,
                label: self.label,
                created_by,
                created_at,
                modifiable: self.modifiable,
            }),
            ThingKind::Class => Thing::Class(Class {
                id,
                label: self.label,
                uri: self.uri,
                created_by,
                created_at,
                modifiable: self.modifiable,
            }),
        };
        Ok(thing)
    }
}

struct StatementRow {
    id: String,
    subject_id: String,
    predicate_id: String,
    object_id: String,
    created_by: String,
    created_at: String,
    index: Option<i64>,
    modifiable: bool,
}

impl StatementRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject_id: row.get(1)?,
            predicate_id: row.get(2)?,
            object_id: row.get(3)?,
            created_by: row.get(4)?,
            created_at: row.get(5)?,
            index: row.get(6)?,
            modifiable: row.get(7)?,
        })
    }
}

fn load_classes(conn: &Connection, id: &ThingId) -> StorageResult<BTreeSet<ThingId>> {
    let mut stmt = conn.prepare_cached("SELECT class_id FROM instance_of WHERE resource_id = ?1")?;
    let classes = stmt
        .query_map(params![id.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(classes.into_iter().map(ThingId::new).collect())
}

fn load_thing(conn: &Connection, id: &ThingId) -> StorageResult<Option<Thing>> {
    let sql = format!("SELECT {} FROM things t WHERE t.id = ?1", THING_COLUMNS);
    let row = conn
        .query_row(&sql, params![id.as_str()], ThingRow::read)
        .optional()?;
    row.map(|r| r.into_thing(conn)).transpose()
}

fn thing_exists(conn: &Connection, id: &str) -> StorageResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM things WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?)
}

fn statement_exists(conn: &Connection, id: &str) -> StorageResult<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM statements WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?)
}

/// Resolve statement rows into statements, loading each thing once
fn hydrate_statements(conn: &Connection, rows: Vec<StatementRow>) -> StorageResult<Vec<Statement>> {
    let mut things: HashMap<String, Thing> = HashMap::new();
    let mut resolve = |id: &str| -> StorageResult<Thing> {
        if let Some(thing) = things.get(id) {
            return Ok(thing.clone());
        }
        let thing = load_thing(conn, &ThingId::new(id))?
            .ok_or_else(|| StorageError::ThingNotFound(id.to_string()))?;
        things.insert(id.to_string(), thing.clone());
        Ok(thing)
    };
    let mut statements = Vec::with_capacity(rows.len());
    for row in rows {
        let subject = resolve(&row.subject_id)?;
        let predicate = match resolve(&row.predicate_id)? {
            Thing::Predicate(p) => p,
            other => {
                return Err(StorageError::Corrupt(format!(
                    "statement \"{}\" uses \"{}\" as predicate",
                    row.id,
                    other.id()
                )))
            }
        };
        let object = resolve(&row.object_id)?;
        statements.push(Statement {
            id: StatementId::new(row.id),
            subject,
            predicate,
            object,
            created_by: parse_contributor(&row.created_by)?,
            created_at: parse_timestamp(&row.created_at)?,
            index: row.index,
            modifiable: row.modifiable,
        });
    }
    Ok(statements)
}

fn query_statement_rows(conn: &Connection, sql: &str, values: &SqlParams) -> StorageResult<Vec<StatementRow>> {
    let refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(refs.as_slice(), StatementRow::read)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Delete statements and any literal objects they leave unconnected
///
/// Returns the ids of the deleted literals.
fn delete_statements_in(conn: &Connection, ids: &BTreeSet<StatementId>) -> StorageResult<Vec<ThingId>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let id_params: Vec<&dyn ToSql> = ids.iter().map(|id| id as &dyn ToSql).collect();
    let candidates: Vec<String> = {
        let sql = format!(
            "SELECT DISTINCT s.object_id FROM statements s JOIN things t ON t.id = s.object_id
             WHERE t.kind = 'literal' AND s.id IN ({})",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(id_params.as_slice(), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        found
    };
    conn.execute(
        &format!("DELETE FROM statements WHERE id IN ({})", placeholders(ids.len())),
        id_params.as_slice(),
    )?;

    let mut orphans = Vec::new();
    for literal in candidates {
        let removed = conn.execute(
            "DELETE FROM things WHERE id = ?1 AND kind = 'literal'
             AND NOT EXISTS (SELECT 1 FROM statements WHERE subject_id = ?1 OR object_id = ?1)",
            params![literal],
        )?;
        if removed > 0 {
            orphans.push(ThingId::new(literal));
        }
    }
    if !orphans.is_empty() {
        tracing::debug!(count = orphans.len(), "removed orphaned literals");
    }
    Ok(orphans)
}

impl ToSql for StatementId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        self.as_str().to_sql()
    }
}

impl ToSql for ThingId {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        self.as_str().to_sql()
    }
}

// === Query building ===

fn push_label_conditions(label: Option<&SearchString>, conditions: &mut Vec<String>, values: &mut SqlParams) {
    match label {
        Some(SearchString::Exact(input)) => {
            conditions.push("lower(t.label) = lower(?)".to_string());
            values.push(Box::new(input.clone()));
        }
        Some(search @ SearchString::Fuzzy(input)) => {
            conditions.push("length(t.label) >= ?".to_string());
            values.push(Box::new(input.chars().count() as i64));
            let tokens = search.tokens();
            if !tokens.is_empty() {
                let any = vec!["instr(lower(t.label), ?) > 0"; tokens.len()].join(" OR ");
                conditions.push(format!("({})", any));
                for token in tokens {
                    values.push(Box::new(token));
                }
            }
        }
        None => {}
    }
}

fn resource_conditions(filter: &ResourceFilter) -> (Vec<String>, SqlParams) {
    let mut conditions = vec!["t.kind = 'resource'".to_string()];
    let mut values: SqlParams = Vec::new();
    push_label_conditions(filter.label.as_ref(), &mut conditions, &mut values);
    if let Some(visibility) = filter.visibility {
        let targets = visibility.targets();
        conditions.push(format!("t.visibility IN ({})", placeholders(targets.len())));
        for target in targets {
            values.push(Box::new(target.as_str()));
        }
    }
    if let Some(created_by) = filter.created_by {
        conditions.push("t.created_by = ?".to_string());
        values.push(Box::new(created_by.to_string()));
    }
    if let Some(start) = filter.created_at_start {
        conditions.push("t.created_at >= ?".to_string());
        values.push(Box::new(timestamp(&start)));
    }
    if let Some(end) = filter.created_at_end {
        conditions.push("t.created_at <= ?".to_string());
        values.push(Box::new(timestamp(&end)));
    }
    for class in &filter.include_classes {
        conditions.push(
            "EXISTS (SELECT 1 FROM instance_of i WHERE i.resource_id = t.id AND i.class_id = ?)".to_string(),
        );
        values.push(Box::new(class.as_str().to_string()));
    }
    for class in &filter.exclude_classes {
        conditions.push(
            "NOT EXISTS (SELECT 1 FROM instance_of i WHERE i.resource_id = t.id AND i.class_id = ?)".to_string(),
        );
        values.push(Box::new(class.as_str().to_string()));
    }
    if let Some(base) = &filter.base_class {
        conditions.push(format!(
            "EXISTS (SELECT 1 FROM instance_of i WHERE i.resource_id = t.id AND i.class_id IN ({}))",
            SUBCLASS_CLOSURE
        ));
        values.push(Box::new(base.as_str().to_string()));
    }
    if let Some(observatory) = filter.observatory_id {
        conditions.push("t.observatory_id = ?".to_string());
        values.push(Box::new(observatory.to_string()));
    }
    if let Some(organization) = filter.organization_id {
        conditions.push("t.organization_id = ?".to_string());
        values.push(Box::new(organization.to_string()));
    }
    (conditions, values)
}

fn order_by(page: &PageRequest, alias: &str) -> String {
    if page.sort.is_empty() {
        return format!("{alias}.created_at ASC, {alias}.id ASC");
    }
    let mut items: Vec<String> = page
        .sort
        .iter()
        .map(|s| {
            let direction = match s.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            format!("{}.{} {}", alias, s.property.column(), direction)
        })
        .collect();
    if !page.sort.iter().any(|s| s.property == SortProperty::Id) {
        items.push(format!("{alias}.id ASC"));
    }
    items.join(", ")
}

fn limit_clause(page: &PageRequest) -> String {
    match page.size {
        Some(size) => format!(" LIMIT {} OFFSET {}", size, page.offset()),
        None => String::new(),
    }
}

/// Run a thing query, ranking fuzzy label matches in process
fn query_things(
    conn: &Connection,
    conditions: &[String],
    values: SqlParams,
    label: Option<&SearchString>,
    page: &PageRequest,
) -> StorageResult<Page<Thing>> {
    let where_clause = conditions.join(" AND ");
    let refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM things t WHERE {}", where_clause),
        refs.as_slice(),
        |row| row.get(0),
    )?;

    let fuzzy = matches!(label, Some(SearchString::Fuzzy(_)));
    let sql = if fuzzy {
        format!("SELECT {} FROM things t WHERE {}", THING_COLUMNS, where_clause)
    } else {
        format!(
            "SELECT {} FROM things t WHERE {} ORDER BY {}{}",
            THING_COLUMNS,
            where_clause,
            order_by(page, "t"),
            limit_clause(page)
        )
    };
    let rows = {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(refs.as_slice(), ThingRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };
    let mut things = rows
        .into_iter()
        .map(|r| r.into_thing(conn))
        .collect::<StorageResult<Vec<_>>>()?;

    if let Some(search) = label.filter(|_| fuzzy) {
        rank_fuzzy(&mut things, search);
        let offset = page.offset();
        things = things
            .into_iter()
            .skip(offset)
            .take(page.size.unwrap_or(usize::MAX))
            .collect();
    }

    Ok(Page {
        content: things,
        page: page.page,
        size: page.size,
        total_elements: total as usize,
    })
}

/// Order fuzzy hits by label length, then score, then age
fn rank_fuzzy(things: &mut [Thing], search: &SearchString) {
    let tokens = search.tokens();
    let whole = search.input().to_lowercase();
    let score = |label: &str| -> usize {
        let lower = label.to_lowercase();
        let matched = tokens.iter().filter(|t| lower.contains(t.as_str())).count();
        if !whole.is_empty() && lower.contains(&whole) {
            matched + tokens.len()
        } else {
            matched
        }
    };
    things.sort_by(|a, b| {
        a.label()
            .chars()
            .count()
            .cmp(&b.label().chars().count())
            .then(score(b.label()).cmp(&score(a.label())))
            .then(created_at(a).cmp(&created_at(b)))
    });
}

fn created_at(thing: &Thing) -> DateTime<Utc> {
    match thing {
        Thing::Resource(r) => r.created_at,
        Thing::Literal(l) => l.created_at,
        Thing::Predicate(p) => p.created_at,
        Thing::Class(c) => c.created_at,
    }
}

fn statement_conditions(filter: &StatementFilter) -> (Vec<String>, SqlParams) {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: SqlParams = Vec::new();
    if let Some(subject) = &filter.subject_id {
        conditions.push("s.subject_id = ?".to_string());
        values.push(Box::new(subject.as_str().to_string()));
    }
    for class in &filter.subject_classes {
        conditions.push(
            "EXISTS (SELECT 1 FROM instance_of i WHERE i.resource_id = s.subject_id AND i.class_id = ?)".to_string(),
        );
        values.push(Box::new(class.as_str().to_string()));
    }
    if let Some(predicate) = &filter.predicate_id {
        conditions.push("s.predicate_id = ?".to_string());
        values.push(Box::new(predicate.as_str().to_string()));
    }
    if let Some(object) = &filter.object_id {
        conditions.push("s.object_id = ?".to_string());
        values.push(Box::new(object.as_str().to_string()));
    }
    for class in &filter.object_classes {
        conditions.push(
            "EXISTS (SELECT 1 FROM instance_of i WHERE i.resource_id = s.object_id AND i.class_id = ?)".to_string(),
        );
        values.push(Box::new(class.as_str().to_string()));
    }
    if let Some(label) = &filter.object_label {
        conditions.push("EXISTS (SELECT 1 FROM things o WHERE o.id = s.object_id AND o.label = ?)".to_string());
        values.push(Box::new(label.clone()));
    }
    if let Some(created_by) = filter.created_by {
        conditions.push("s.created_by = ?".to_string());
        values.push(Box::new(created_by.to_string()));
    }
    if let Some(start) = filter.created_at_start {
        conditions.push("s.created_at >= ?".to_string());
        values.push(Box::new(timestamp(&start)));
    }
    if let Some(end) = filter.created_at_end {
        conditions.push("s.created_at <= ?".to_string());
        values.push(Box::new(timestamp(&end)));
    }
    if conditions.is_empty() {
        conditions.push("1 = 1".to_string());
    }
    (conditions, values)
}

/// Labels a node carries for bundle filtering
fn node_labels(thing: &Thing) -> BTreeSet<ThingId> {
    let mut labels = thing.classes();
    labels.insert(ThingId::new(classes::THING));
    let kind = match thing.kind() {
        ThingKind::Resource => classes::RESOURCE,
        ThingKind::Literal => classes::LITERAL,
        ThingKind::Predicate => classes::PREDICATE,
        ThingKind::Class => classes::CLASS,
    };
    labels.insert(ThingId::new(kind));
    labels
}

// === Repository implementations ===

impl ResourceRepository for SqliteGraph {
    fn next_resource_id(&self) -> StorageResult<ThingId> {
        self.next_id(IdSequence::Resource).map(ThingId::new)
    }

    fn save_resource(&self, resource: &Resource) -> StorageResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let existing: Option<String> = tx
            .query_row(
                "SELECT kind FROM things WHERE id = ?1",
                params![resource.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        let observatory = resource.observatory_id.to_string();
        let organization = resource.organization_id.to_string();
        let unlisted_by = resource.unlisted_by.map(|c| c.to_string());
        match existing.as_deref() {
            None => {
                tx.execute(
                    "INSERT INTO things (id, kind, label, created_by, created_at, observatory_id,
                        organization_id, extraction_method, visibility, verified, unlisted_by,
                        modifiable, version)
                     VALUES (?1, 'resource', ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
                    params![
                        resource.id.as_str(),
                        resource.label,
                        resource.created_by.to_string(),
                        timestamp(&resource.created_at),
                        observatory,
                        organization,
                        resource.extraction_method.as_str(),
                        resource.visibility.as_str(),
                        resource.verified,
                        unlisted_by,
                        resource.modifiable,
                    ],
                )?;
                for class in &resource.classes {
                    tx.execute(
                        "INSERT INTO instance_of (resource_id, class_id) VALUES (?1, ?2)",
                        params![resource.id.as_str(), class.as_str()],
                    )?;
                }
            }
            Some("resource") => {
                let updated = tx.execute(
                    "UPDATE things SET label = ?1, observatory_id = ?2, organization_id = ?3,
                        extraction_method = ?4, visibility = ?5, verified = ?6, unlisted_by = ?7,
                        modifiable = ?8, version = version + 1
                     WHERE id = ?9 AND kind = 'resource' AND version = ?10",
                    params![
                        resource.label,
                        observatory,
                        organization,
                        resource.extraction_method.as_str(),
                        resource.visibility.as_str(),
                        resource.verified,
                        unlisted_by,
                        resource.modifiable,
                        resource.id.as_str(),
                        resource.version,
                    ],
                )?;
                if updated == 0 {
                    return Err(StorageError::Conflict {
                        id: resource.id.clone(),
                        expected: resource.version,
                    });
                }
                let old = load_classes(&tx, &resource.id)?;
                for removed in old.difference(&resource.classes) {
                    tx.execute(
                        "DELETE FROM instance_of WHERE resource_id = ?1 AND class_id = ?2",
                        params![resource.id.as_str(), removed.as_str()],
                    )?;
                }
                for added in resource.classes.difference(&old) {
                    tx.execute(
                        "INSERT INTO instance_of (resource_id, class_id) VALUES (?1, ?2)",
                        params![resource.id.as_str(), added.as_str()],
                    )?;
                }
            }
            Some(other) => {
                return Err(StorageError::Corrupt(format!(
                    "\"{}\" already exists as {}",
                    resource.id, other
                )))
            }
        }
        tx.commit()?;
        drop(conn);
        self.cache.evict(ThingKind::Resource, &resource.id);
        tracing::debug!(id = %resource.id, version = resource.version, "saved resource");
        Ok(())
    }

    fn delete_resource(&self, id: &ThingId) -> StorageResult<bool> {
        self.delete_thing(id, ThingKind::Resource)
    }

    fn find_resource(&self, id: &ThingId) -> StorageResult<Option<Resource>> {
        self.cache.read_through(&self.cache.resources, id, || {
            Ok(self
                .load_kind(id, ThingKind::Resource)?
                .and_then(|t| match t {
                    Thing::Resource(r) => Some(r),
                    _ => None,
                }))
        })
    }

    fn resource_exists(&self, id: &ThingId) -> StorageResult<bool> {
        self.cache
            .exists_through(&self.cache.resources, id, || self.kind_exists(id, ThingKind::Resource))
    }

    fn find_resources(&self, filter: &ResourceFilter, page: &PageRequest) -> StorageResult<Page<Resource>> {
        let (conditions, values) = resource_conditions(filter);
        let conn = self.conn();
        let page = query_things(&conn, &conditions, values, filter.label.as_ref(), page)?;
        let content = page
            .content
            .into_iter()
            .filter_map(|t| match t {
                Thing::Resource(r) => Some(r),
                _ => None,
            })
            .collect();
        Ok(Page {
            content,
            page: page.page,
            size: page.size,
            total_elements: page.total_elements,
        })
    }

    fn count_resources(&self, filter: &ResourceFilter) -> StorageResult<usize> {
        let (conditions, values) = resource_conditions(filter);
        let refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let count: i64 = self.conn().query_row(
            &format!("SELECT COUNT(*) FROM things t WHERE {}", conditions.join(" AND ")),
            refs.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl LiteralRepository for SqliteGraph {
    fn next_literal_id(&self) -> StorageResult<ThingId> {
        self.next_id(IdSequence::Literal).map(ThingId::new)
    }

    fn save_literal(&self, literal: &Literal) -> StorageResult<()> {
        self.save_simple_thing(&Thing::Literal(literal.clone()))
    }

    fn delete_literal(&self, id: &ThingId) -> StorageResult<bool> {
        self.delete_thing(id, ThingKind::Literal)
    }

    fn find_literal(&self, id: &ThingId) -> StorageResult<Option<Literal>> {
        self.cache.read_through(&self.cache.literals, id, || {
            Ok(self.load_kind(id, ThingKind::Literal)?.and_then(|t| match t {
                Thing::Literal(l) => Some(l),
                _ => None,
            }))
        })
    }

    fn literal_exists(&self, id: &ThingId) -> StorageResult<bool> {
        self.cache
            .exists_through(&self.cache.literals, id, || self.kind_exists(id, ThingKind::Literal))
    }
}

impl PredicateRepository for SqliteGraph {
    fn next_predicate_id(&self) -> StorageResult<ThingId> {
        self.next_id(IdSequence::Predicate).map(ThingId::new)
    }

    fn save_predicate(&self, predicate: &Predicate) -> StorageResult<()> {
        self.save_simple_thing(&Thing::Predicate(predicate.clone()))
    }

    fn delete_predicate(&self, id: &ThingId) -> StorageResult<bool> {
        self.delete_thing(id, ThingKind::Predicate)
    }

    fn find_predicate(&self, id: &ThingId) -> StorageResult<Option<Predicate>> {
        self.cache.read_through(&self.cache.predicates, id, || {
            Ok(self.load_kind(id, ThingKind::Predicate)?.and_then(|t| match t {
                Thing::Predicate(p) => Some(p),
                _ => None,
            }))
        })
    }

    fn predicate_exists(&self, id: &ThingId) -> StorageResult<bool> {
        self.cache
            .exists_through(&self.cache.predicates, id, || self.kind_exists(id, ThingKind::Predicate))
    }

    fn find_predicates(&self, label: Option<&SearchString>, page: &PageRequest) -> StorageResult<Page<Predicate>> {
        Ok(self.find_labeled(ThingKind::Predicate, label, page)?.map(|t| match t {
            Thing::Predicate(p) => p,
            other => Predicate::new(other.id().clone(), other.label()),
        }))
    }
}

impl ClassRepository for SqliteGraph {
    fn next_class_id(&self) -> StorageResult<ThingId> {
        self.next_id(IdSequence::Class).map(ThingId::new)
    }

    fn save_class(&self, class: &Class) -> StorageResult<()> {
        self.save_simple_thing(&Thing::Class(class.clone()))
    }

    fn find_class(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        self.cache.read_through(&self.cache.classes, id, || {
            Ok(self.load_kind(id, ThingKind::Class)?.and_then(|t| match t {
                Thing::Class(c) => Some(c),
                _ => None,
            }))
        })
    }

    fn class_exists(&self, id: &ThingId) -> StorageResult<bool> {
        self.cache
            .exists_through(&self.cache.classes, id, || self.kind_exists(id, ThingKind::Class))
    }

    fn all_classes_exist(&self, ids: &BTreeSet<ThingId>) -> StorageResult<bool> {
        for id in ids {
            if !self.class_exists(id)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn find_class_by_uri(&self, uri: &str) -> StorageResult<Option<Class>> {
        let conn = self.conn();
        let sql = format!("SELECT {} FROM things t WHERE t.kind = 'class' AND t.uri = ?1", THING_COLUMNS);
        let row = conn.query_row(&sql, params![uri], ThingRow::read).optional()?;
        match row.map(|r| r.into_thing(&conn)).transpose()? {
            Some(Thing::Class(c)) => Ok(Some(c)),
            _ => Ok(None),
        }
    }

    fn find_classes(&self, label: Option<&SearchString>, page: &PageRequest) -> StorageResult<Page<Class>> {
        Ok(self.find_labeled(ThingKind::Class, label, page)?.map(|t| match t {
            Thing::Class(c) => c,
            other => Class::new(other.id().clone(), other.label()),
        }))
    }
}

impl ThingRepository for SqliteGraph {
    fn find_thing(&self, id: &ThingId) -> StorageResult<Option<Thing>> {
        self.cache.thing_through(id, || load_thing(&self.conn(), id))
    }

    fn thing_exists(&self, id: &ThingId) -> StorageResult<bool> {
        thing_exists(&self.conn(), id.as_str())
    }
}

impl StatementRepository for SqliteGraph {
    fn next_statement_id(&self) -> StorageResult<StatementId> {
        self.next_id(IdSequence::Statement).map(StatementId::new)
    }

    fn save_statement(&self, statement: &Statement) -> StorageResult<()> {
        self.conn().execute(
            "INSERT INTO statements (id, subject_id, predicate_id, object_id, created_by, created_at,
                stmt_index, modifiable)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                statement.id.as_str(),
                statement.subject_id().as_str(),
                statement.predicate_id().as_str(),
                statement.object_id().as_str(),
                statement.created_by.to_string(),
                timestamp(&statement.created_at),
                statement.index,
                statement.modifiable,
            ],
        )?;
        Ok(())
    }

    fn delete_statements(&self, ids: &BTreeSet<StatementId>) -> StorageResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let orphans = delete_statements_in(&tx, ids)?;
        tx.commit()?;
        drop(conn);
        for literal in orphans {
            self.cache.evict(ThingKind::Literal, &literal);
        }
        Ok(())
    }

    fn update_statement_index(&self, id: &StatementId, index: Option<i64>) -> StorageResult<()> {
        self.conn().execute(
            "UPDATE statements SET stmt_index = ?1 WHERE id = ?2",
            params![index, id.as_str()],
        )?;
        Ok(())
    }

    fn find_statement(&self, id: &StatementId) -> StorageResult<Option<Statement>> {
        let conn = self.conn();
        let sql = format!("SELECT {} FROM statements s WHERE s.id = ?", STATEMENT_COLUMNS);
        let values: SqlParams = vec![Box::new(id.as_str().to_string())];
        let rows = query_statement_rows(&conn, &sql, &values)?;
        Ok(hydrate_statements(&conn, rows)?.into_iter().next())
    }

    fn find_statements(&self, filter: &StatementFilter, page: &PageRequest) -> StorageResult<Page<Statement>> {
        let (conditions, values) = statement_conditions(filter);
        let where_clause = conditions.join(" AND ");
        let conn = self.conn();
        let refs: Vec<&dyn ToSql> = values.iter().map(|p| p.as_ref()).collect();
        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM statements s WHERE {}", where_clause),
            refs.as_slice(),
            |row| row.get(0),
        )?;
        let sort: Vec<_> = page
            .sort
            .iter()
            .filter(|s| matches!(s.property, SortProperty::Id | SortProperty::CreatedAt | SortProperty::CreatedBy))
            .copied()
            .collect();
        let ordering = order_by(&PageRequest { sort, ..page.clone() }, "s");
        let sql = format!(
            "SELECT {} FROM statements s WHERE {} ORDER BY {}{}",
            STATEMENT_COLUMNS,
            where_clause,
            ordering,
            limit_clause(page)
        );
        let rows = query_statement_rows(&conn, &sql, &values)?;
        Ok(Page {
            content: hydrate_statements(&conn, rows)?,
            page: page.page,
            size: page.size,
            total_elements: total as usize,
        })
    }

    fn count_incoming_statements(&self, id: &ThingId) -> StorageResult<usize> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM statements WHERE object_id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn fetch_as_bundle(&self, id: &ThingId, configuration: &BundleConfiguration) -> StorageResult<Vec<Statement>> {
        let max_level = configuration.max_level.unwrap_or(usize::MAX);
        let min_level = configuration.min_level.unwrap_or(0);
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM statements s WHERE s.subject_id = ? ORDER BY s.created_at ASC, s.id ASC",
            STATEMENT_COLUMNS
        );

        let mut visited: HashSet<ThingId> = HashSet::from([id.clone()]);
        let mut frontier: VecDeque<(ThingId, usize)> = VecDeque::from([(id.clone(), 0)]);
        let mut bundle = Vec::new();
        while let Some((node, depth)) = frontier.pop_front() {
            if depth >= max_level {
                continue;
            }
            let values: SqlParams = vec![Box::new(node.as_str().to_string())];
            let rows = query_statement_rows(&conn, &sql, &values)?;
            for statement in hydrate_statements(&conn, rows)? {
                if !configuration.admits(&node_labels(&statement.object)) {
                    continue;
                }
                let object = statement.object_id().clone();
                let traversable = !statement.object.is_literal();
                if depth + 1 >= min_level {
                    bundle.push(statement);
                }
                if traversable && visited.insert(object.clone()) {
                    frontier.push_back((object, depth + 1));
                }
            }
        }
        bundle.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        tracing::debug!(root = %id, statements = bundle.len(), "fetched bundle");
        Ok(bundle)
    }
}

impl ClassHierarchyRepository for SqliteGraph {
    fn save_relations(&self, relations: &[ClassSubclassRelation]) -> StorageResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for relation in relations {
            tx.execute(
                "INSERT INTO subclass_of (child_id, parent_id, created_by, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    relation.child.as_str(),
                    relation.parent.as_str(),
                    relation.created_by.to_string(),
                    timestamp(&relation.created_at),
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete_relation_by_child(&self, child: &ThingId) -> StorageResult<()> {
        self.conn()
            .execute("DELETE FROM subclass_of WHERE child_id = ?1", params![child.as_str()])?;
        Ok(())
    }

    fn find_children(&self, id: &ThingId, page: &PageRequest) -> StorageResult<Page<ChildClass>> {
        let conn = self.conn();
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM subclass_of WHERE parent_id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        let sql = format!(
            "SELECT h.child_id, (SELECT COUNT(*) FROM subclass_of g WHERE g.parent_id = h.child_id)
             FROM subclass_of h WHERE h.parent_id = ?1 ORDER BY h.child_id ASC{}",
            limit_clause(page)
        );
        let rows: Vec<(String, i64)> = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        let mut content = Vec::with_capacity(rows.len());
        for (child, count) in rows {
            if let Some(Thing::Class(class)) = load_thing(&conn, &ThingId::new(child))? {
                content.push(ChildClass { class, child_count: count as usize });
            }
        }
        Ok(Page { content, page: page.page, size: page.size, total_elements: total as usize })
    }

    fn find_parent(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        let conn = self.conn();
        let parent: Option<String> = conn
            .query_row(
                "SELECT parent_id FROM subclass_of WHERE child_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match parent {
            Some(parent) => match load_thing(&conn, &ThingId::new(parent))? {
                Some(Thing::Class(c)) => Ok(Some(c)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn find_root(&self, id: &ThingId) -> StorageResult<Option<Class>> {
        let conn = self.conn();
        let root: Option<String> = conn
            .query_row(
                "WITH RECURSIVE up(id, depth) AS (
                    SELECT parent_id, 1 FROM subclass_of WHERE child_id = ?1
                    UNION
                    SELECT h.parent_id, up.depth + 1 FROM subclass_of h JOIN up ON h.child_id = up.id
                 )
                 SELECT id FROM up ORDER BY depth DESC LIMIT 1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        match root {
            Some(root) => match load_thing(&conn, &ThingId::new(root))? {
                Some(Thing::Class(c)) => Ok(Some(c)),
                _ => Ok(None),
            },
            None => Ok(None),
        }
    }

    fn find_all_roots(&self, page: &PageRequest) -> StorageResult<Page<Class>> {
        let conditions = vec![
            "t.kind = 'class'".to_string(),
            "NOT EXISTS (SELECT 1 FROM subclass_of h WHERE h.child_id = t.id)".to_string(),
        ];
        let by_id = PageRequest {
            sort: vec![Sort::asc(SortProperty::Id)],
            ..page.clone()
        };
        let conn = self.conn();
        Ok(query_things(&conn, &conditions, Vec::new(), None, &by_id)?.map(|t| match t {
            Thing::Class(c) => c,
            other => Class::new(other.id().clone(), other.label()),
        }))
    }

    fn find_class_hierarchy(&self, id: &ThingId, page: &PageRequest) -> StorageResult<Page<ClassHierarchyEntry>> {
        let conn = self.conn();
        let rows: Vec<(String, Option<String>)> = {
            let mut stmt = conn.prepare(
                "WITH RECURSIVE up(id) AS (
                    SELECT ?1
                    UNION
                    SELECT h.parent_id FROM subclass_of h JOIN up ON h.child_id = up.id
                 )
                 SELECT up.id, (SELECT parent_id FROM subclass_of p WHERE p.child_id = up.id)
                 FROM up ORDER BY up.id ASC",
            )?;
            let rows = stmt
                .query_map(params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        let mut entries = Vec::new();
        for (class_id, parent) in rows {
            if let Some(Thing::Class(class)) = load_thing(&conn, &ThingId::new(class_id))? {
                entries.push(ClassHierarchyEntry { class, parent_id: parent.map(ThingId::new) });
            }
        }
        let total = entries.len();
        let content = entries
            .into_iter()
            .skip(page.offset())
            .take(page.size.unwrap_or(usize::MAX))
            .collect();
        Ok(Page { content, page: page.page, size: page.size, total_elements: total })
    }

    fn count_class_instances(&self, id: &ThingId) -> StorageResult<usize> {
        let count: i64 = self.conn().query_row(
            &format!(
                "SELECT COUNT(DISTINCT i.resource_id) FROM instance_of i WHERE i.class_id IN ({})",
                SUBCLASS_CLOSURE
            ),
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn exists_child(&self, id: &ThingId, child: &ThingId) -> StorageResult<bool> {
        let exists = self.conn().query_row(
            "WITH RECURSIVE up(id) AS (
                SELECT parent_id FROM subclass_of WHERE child_id = ?1
                UNION
                SELECT h.parent_id FROM subclass_of h JOIN up ON h.child_id = up.id
             )
             SELECT EXISTS(SELECT 1 FROM up WHERE id = ?2)",
            params![child.as_str(), id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn exists_children(&self, id: &ThingId) -> StorageResult<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS(SELECT 1 FROM subclass_of WHERE parent_id = ?1)",
            params![id.as_str()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }
}

impl PublishedContentRepository for SqliteGraph {
    fn save_published(&self, content: &PublishedContent) -> StorageResult<()> {
        let json = serde_json::to_string(&content.subgraph)?;
        self.conn().execute(
            "INSERT INTO published_contents (id, root_id, subgraph_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET root_id = excluded.root_id, subgraph_json = excluded.subgraph_json",
            params![content.id.as_str(), content.root_id.as_str(), json],
        )?;
        Ok(())
    }

    fn find_published(&self, id: &ThingId) -> StorageResult<Option<PublishedContent>> {
        let row: Option<(String, String)> = self
            .conn()
            .query_row(
                "SELECT root_id, subgraph_json FROM published_contents WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        row.map(|(root, json)| {
            Ok(PublishedContent {
                id: id.clone(),
                root_id: ThingId::new(root),
                subgraph: serde_json::from_str(&json)?,
            })
        })
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::VisibilityFilter;
    use chrono::Duration;

    fn create_test_store() -> SqliteGraph {
        SqliteGraph::open_in_memory().unwrap()
    }

    fn resource(id: &str, label: &str, classes: &[&str]) -> Resource {
        let mut r = Resource::new(ThingId::new(id), label);
        for c in classes {
            r.classes.insert(ThingId::new(*c));
        }
        r
    }

    fn add(store: &SqliteGraph, id: &str, subject: &str, predicate: &str, object: &str) -> Statement {
        let statement = Statement {
            id: StatementId::new(id),
            subject: store.find_thing(&ThingId::new(subject)).unwrap().unwrap(),
            predicate: store.find_predicate(&ThingId::new(predicate)).unwrap().unwrap(),
            object: store.find_thing(&ThingId::new(object)).unwrap().unwrap(),
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            index: None,
            modifiable: true,
        };
        store.save_statement(&statement).unwrap();
        statement
    }

    fn predicate(store: &SqliteGraph, id: &str) {
        store.save_predicate(&Predicate::new(ThingId::new(id), id)).unwrap();
    }

    // === Resources ===

    #[test]
    fn new_resources_start_at_version_zero() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "first", &["Paper"])).unwrap();

        let loaded = store.find_resource(&ThingId::new("R1")).unwrap().unwrap();
        assert_eq!(loaded.version, 0);
        assert!(loaded.has_class("Paper"));
    }

    #[test]
    fn update_with_stale_version_is_a_conflict() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "first", &[])).unwrap();

        let mut current = store.find_resource(&ThingId::new("R1")).unwrap().unwrap();
        let stale = current.clone();
        current.label = "second".into();
        store.save_resource(&current).unwrap();

        let err = store.save_resource(&stale).unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 0, .. }));
        let loaded = store.find_resource(&ThingId::new("R1")).unwrap().unwrap();
        assert_eq!(loaded.label, "second");
        assert_eq!(loaded.version, 1);
    }

    #[test]
    fn class_membership_is_diffed_on_update() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "r", &["A", "B"])).unwrap();
        let mut r = store.find_resource(&ThingId::new("R1")).unwrap().unwrap();
        r.classes.remove(&ThingId::new("A"));
        r.classes.insert(ThingId::new("C"));
        store.save_resource(&r).unwrap();

        let loaded = store.find_resource(&ThingId::new("R1")).unwrap().unwrap();
        let classes: Vec<_> = loaded.classes.iter().map(|c| c.as_str().to_string()).collect();
        assert_eq!(classes, vec!["B", "C"]);
    }

    #[test]
    fn cached_reads_are_evicted_by_writes() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "before", &[])).unwrap();
        let id = ThingId::new("R1");
        assert_eq!(store.find_resource(&id).unwrap().unwrap().label, "before");

        // Write behind the cache's back: the cached value is still served
        store
            .conn()
            .execute("UPDATE things SET label = 'sneaky' WHERE id = 'R1'", [])
            .unwrap();
        assert_eq!(store.find_resource(&id).unwrap().unwrap().label, "before");

        let mut r = store.find_resource(&id).unwrap().unwrap();
        r.label = "after".into();
        store.save_resource(&r).unwrap();
        assert_eq!(store.find_resource(&id).unwrap().unwrap().label, "after");
        assert_eq!(store.find_thing(&id).unwrap().unwrap().label(), "after");
    }

    #[test]
    fn generated_ids_skip_manually_assigned_ones() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "manual", &[])).unwrap();
        store.save_resource(&resource("R2", "manual", &[])).unwrap();

        assert_eq!(store.next_resource_id().unwrap(), ThingId::new("R3"));
        assert_eq!(store.next_resource_id().unwrap(), ThingId::new("R4"));
        assert_eq!(store.next_literal_id().unwrap(), ThingId::new("L1"));
    }

    #[test]
    fn exact_search_ignores_case() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "Graph Theory", &[])).unwrap();
        store.save_resource(&resource("R2", "Graph theory basics", &[])).unwrap();

        let filter = ResourceFilter::new().with_label(SearchString::of("graph THEORY", true));
        let page = store.find_resources(&filter, &PageRequest::all()).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].id, ThingId::new("R1"));
    }

    #[test]
    fn fuzzy_search_prefers_short_then_relevant_then_old_labels() {
        let store = create_test_store();
        let now = Utc::now();
        let mut older = resource("R1", "knowledge graphs", &[]);
        older.created_at = now - Duration::days(2);
        let mut newer = resource("R2", "knowledge graphs", &[]);
        newer.created_at = now - Duration::days(1);
        store.save_resource(&newer).unwrap();
        store.save_resource(&older).unwrap();
        store.save_resource(&resource("R3", "graphs of knowledge in science", &[])).unwrap();
        store.save_resource(&resource("R4", "graph", &[])).unwrap();

        let filter = ResourceFilter::new().with_label(SearchString::of("knowledge graphs", false));
        let page = store.find_resources(&filter, &PageRequest::all()).unwrap();
        let ids: Vec<_> = page.content.iter().map(|r| r.id.as_str()).collect();
        // "graph" is shorter than the input and therefore filtered out
        assert_eq!(ids, vec!["R1", "R2", "R3"]);
        assert_eq!(page.total_elements, 3);
    }

    #[test]
    fn resource_filters_combine() {
        let store = create_test_store();
        let creator = ContributorId::new();
        let mut featured = resource("R1", "a", &["Paper"]).with_created_by(creator);
        featured.visibility = Visibility::Featured;
        store.save_resource(&featured).unwrap();
        let mut unlisted = resource("R2", "b", &["Paper"]).with_created_by(creator);
        unlisted.visibility = Visibility::Unlisted;
        store.save_resource(&unlisted).unwrap();
        store.save_resource(&resource("R3", "c", &["Paper", "Comparison"])).unwrap();

        let listed = ResourceFilter::new()
            .with_class("Paper")
            .with_visibility(VisibilityFilter::AllListed);
        assert_eq!(store.count_resources(&listed).unwrap(), 2);

        let mine = ResourceFilter::new().with_created_by(creator).without_class("Comparison");
        let page = store
            .find_resources(&mine, &PageRequest::all().sorted_by(Sort::desc(SortProperty::Label)))
            .unwrap();
        let ids: Vec<_> = page.content.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R2", "R1"]);
    }

    #[test]
    fn pages_slice_the_result() {
        let store = create_test_store();
        for i in 0..5 {
            store.save_resource(&resource(&format!("R{}", i), "x", &[])).unwrap();
        }
        let page = store
            .find_resources(
                &ResourceFilter::new(),
                &PageRequest::of(1, 2).sorted_by(Sort::asc(SortProperty::Id)),
            )
            .unwrap();
        let ids: Vec<_> = page.content.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["R2", "R3"]);
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages(), 3);
    }

    // === Statements ===

    #[test]
    fn statements_require_existing_endpoints() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "r", &[])).unwrap();
        predicate(&store, "P1");

        let dangling = Statement {
            id: StatementId::new("S1"),
            subject: Resource::new(ThingId::new("R1"), "r").into(),
            predicate: Predicate::new(ThingId::new("P1"), "p"),
            object: Resource::new(ThingId::new("missing"), "m").into(),
            created_by: ContributorId::UNKNOWN,
            created_at: Utc::now(),
            index: None,
            modifiable: true,
        };
        assert!(matches!(store.save_statement(&dangling), Err(StorageError::Database(_))));
    }

    #[test]
    fn deleting_a_statement_removes_its_orphaned_literal() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "r", &[])).unwrap();
        store.save_resource(&resource("R2", "r", &[])).unwrap();
        predicate(&store, "P1");
        store.save_literal(&Literal::new(ThingId::new("L1"), "shared")).unwrap();
        store.save_literal(&Literal::new(ThingId::new("L2"), "single")).unwrap();
        let s1 = add(&store, "S1", "R1", "P1", "L1");
        add(&store, "S2", "R2", "P1", "L1");
        let s3 = add(&store, "S3", "R1", "P1", "L2");

        // prime the cache
        assert!(store.find_literal(&ThingId::new("L2")).unwrap().is_some());

        store
            .delete_statements(&BTreeSet::from([s1.id.clone(), s3.id.clone()]))
            .unwrap();

        assert!(store.find_literal(&ThingId::new("L1")).unwrap().is_some());
        assert!(store.find_literal(&ThingId::new("L2")).unwrap().is_none());
        assert!(store.find_thing(&ThingId::new("L2")).unwrap().is_none());
    }

    #[test]
    fn statement_filters_match_classes_of_endpoints() {
        let store = create_test_store();
        store.save_resource(&resource("C1", "comparison", &["Comparison"])).unwrap();
        store.save_resource(&resource("F1", "figure", &["ComparisonRelatedFigure"])).unwrap();
        store.save_resource(&resource("X1", "other", &[])).unwrap();
        predicate(&store, "hasRelatedFigure");
        add(&store, "S1", "C1", "hasRelatedFigure", "F1");
        add(&store, "S2", "C1", "hasRelatedFigure", "X1");

        let filter = StatementFilter::new()
            .with_subject("C1")
            .with_predicate("hasRelatedFigure")
            .with_object_class("ComparisonRelatedFigure");
        let page = store.find_statements(&filter, &PageRequest::all()).unwrap();
        assert_eq!(page.content.len(), 1);
        assert_eq!(page.content[0].id, StatementId::new("S1"));
        assert_eq!(store.count_incoming_statements(&ThingId::new("F1")).unwrap(), 1);
    }

    #[test]
    fn bundle_respects_depth_and_class_lists() {
        let store = create_test_store();
        store.save_resource(&resource("root", "root", &["Comparison"])).unwrap();
        store.save_resource(&resource("field", "field", &["ResearchField"])).unwrap();
        store.save_resource(&resource("a", "a", &[])).unwrap();
        store.save_resource(&resource("b", "b", &[])).unwrap();
        store.save_resource(&resource("c", "c", &[])).unwrap();
        store.save_literal(&Literal::new(ThingId::new("L1"), "text")).unwrap();
        predicate(&store, "p");
        add(&store, "S1", "root", "p", "field");
        add(&store, "S2", "root", "p", "a");
        add(&store, "S3", "a", "p", "b");
        add(&store, "S4", "b", "p", "c");
        add(&store, "S5", "a", "p", "L1");
        add(&store, "S6", "field", "p", "c");

        let ids = |statements: Vec<Statement>| -> Vec<String> {
            let mut ids: Vec<_> = statements.into_iter().map(|s| s.id.as_str().to_string()).collect();
            ids.sort();
            ids
        };

        let blacklisted = BundleConfiguration::new()
            .with_max_level(2)
            .with_blacklist(["ResearchField"]);
        assert_eq!(
            ids(store.fetch_as_bundle(&ThingId::new("root"), &blacklisted).unwrap()),
            vec!["S2", "S3", "S5"]
        );

        let whitelisted = BundleConfiguration::new()
            .with_max_level(1)
            .with_whitelist(["ResearchField"]);
        assert_eq!(
            ids(store.fetch_as_bundle(&ThingId::new("root"), &whitelisted).unwrap()),
            vec!["S1"]
        );

        let deep = BundleConfiguration::new().with_min_level(2);
        assert_eq!(
            ids(store.fetch_as_bundle(&ThingId::new("root"), &deep).unwrap()),
            vec!["S3", "S4", "S5", "S6"]
        );
    }

    #[test]
    fn deleting_a_resource_detaches_its_own_statements() {
        let store = create_test_store();
        store.save_resource(&resource("R1", "r", &[])).unwrap();
        store.save_literal(&Literal::new(ThingId::new("L1"), "x")).unwrap();
        predicate(&store, "P1");
        add(&store, "S1", "R1", "P1", "L1");

        assert!(store.delete_resource(&ThingId::new("R1")).unwrap());
        assert!(store.find_statement(&StatementId::new("S1")).unwrap().is_none());
        assert!(!store.thing_exists(&ThingId::new("L1")).unwrap());
        assert!(!store.resource_exists(&ThingId::new("R1")).unwrap());
    }

    // === Class hierarchy ===

    fn class(store: &SqliteGraph, id: &str) {
        store.save_class(&Class::new(ThingId::new(id), id)).unwrap();
    }

    fn relate(store: &SqliteGraph, parent: &str, child: &str) {
        store
            .save_relations(&[ClassSubclassRelation {
                child: ThingId::new(child),
                parent: ThingId::new(parent),
                created_by: ContributorId::UNKNOWN,
                created_at: Utc::now(),
            }])
            .unwrap();
    }

    #[test]
    fn hierarchy_queries_walk_the_forest() {
        let store = create_test_store();
        for id in ["A", "B", "C", "D", "E"] {
            class(&store, id);
        }
        relate(&store, "A", "B");
        relate(&store, "B", "C");
        relate(&store, "A", "D");

        assert_eq!(store.find_parent(&ThingId::new("C")).unwrap().unwrap().id, ThingId::new("B"));
        assert_eq!(store.find_root(&ThingId::new("C")).unwrap().unwrap().id, ThingId::new("A"));
        assert!(store.find_root(&ThingId::new("A")).unwrap().is_none());

        let children = store.find_children(&ThingId::new("A"), &PageRequest::all()).unwrap();
        let summary: Vec<_> = children
            .content
            .iter()
            .map(|c| (c.class.id.as_str().to_string(), c.child_count))
            .collect();
        assert_eq!(summary, vec![("B".to_string(), 1), ("D".to_string(), 0)]);

        let roots = store.find_all_roots(&PageRequest::all()).unwrap();
        let roots: Vec<_> = roots.content.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(roots, vec!["A", "E"]);

        let path = store.find_class_hierarchy(&ThingId::new("C"), &PageRequest::all()).unwrap();
        let path: Vec<_> = path
            .content
            .iter()
            .map(|e| (e.class.id.as_str().to_string(), e.parent_id.as_ref().map(|p| p.as_str().to_string())))
            .collect();
        assert_eq!(
            path,
            vec![
                ("A".to_string(), None),
                ("B".to_string(), Some("A".to_string())),
                ("C".to_string(), Some("B".to_string())),
            ]
        );

        assert!(store.exists_child(&ThingId::new("A"), &ThingId::new("C")).unwrap());
        assert!(!store.exists_child(&ThingId::new("C"), &ThingId::new("A")).unwrap());
        assert!(store.exists_children(&ThingId::new("B")).unwrap());
        assert!(!store.exists_children(&ThingId::new("C")).unwrap());
    }

    #[test]
    fn instances_of_subclasses_are_counted() {
        let store = create_test_store();
        for id in ["A", "B"] {
            class(&store, id);
        }
        relate(&store, "A", "B");
        store.save_resource(&resource("R1", "r", &["A"])).unwrap();
        store.save_resource(&resource("R2", "r", &["B"])).unwrap();
        store.save_resource(&resource("R3", "r", &["A", "B"])).unwrap();

        assert_eq!(store.count_class_instances(&ThingId::new("A")).unwrap(), 3);
        assert_eq!(store.count_class_instances(&ThingId::new("B")).unwrap(), 2);

        let base = ResourceFilter::new().with_base_class("A");
        assert_eq!(store.count_resources(&base).unwrap(), 3);
    }

    #[test]
    fn store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.db");
        {
            let store = SqliteGraph::open(&path).unwrap();
            store.save_resource(&resource("R1", "persisted", &["Paper"])).unwrap();
        }
        let store = SqliteGraph::open(&path).unwrap();
        let loaded = store.find_resource(&ThingId::new("R1")).unwrap().unwrap();
        assert_eq!(loaded.label, "persisted");
        assert_eq!(store.next_resource_id().unwrap(), ThingId::new("R2"));
    }
}
