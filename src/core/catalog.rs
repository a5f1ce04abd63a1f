//! Symbol catalog for a schema source.
//!
//! Holds the two symbol kinds the splitter moves around:
//! - **Entities**: `export const users = mysqlTable("users", { ... });`
//! - **Derived aliases**: `export type User = typeof users.$inferSelect;`
//!
//! The catalog is built once by the extractor and never mutated afterwards.

use rustc_hash::FxHashMap;
use serde::Serialize;

/// Which projection of an entity a derived alias denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// `$inferSelect`
    Read,
    /// `$inferInsert`
    Write,
}

impl Shape {
    pub fn from_infer_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Select" => Some(Self::Read),
            "Insert" => Some(Self::Write),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    pub physical_name: String,
    /// Verbatim declaration text, from `export` through the closing `)` and optional `;`.
    pub body_text: String,
    /// `//` comment run directly above the declaration (section banners).
    pub leading_comment: Option<String>,
    /// Byte offset of the declaration in the source.
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedAlias {
    pub name: String,
    /// Entity name as written in the alias; may not exist.
    pub referenced_entity: String,
    pub shape: Shape,
    pub body_text: String,
    /// False when `referenced_entity` names no entity in the catalog.
    pub resolved: bool,
    pub offset: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Entity(usize),
    Alias(usize),
}

/// A borrowed view of one catalog entry.
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    Entity(&'a Entity),
    Alias(&'a DerivedAlias),
}

impl<'a> Symbol<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Symbol::Entity(e) => &e.name,
            Symbol::Alias(a) => &a.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Entity(_) => "entity",
            Symbol::Alias(_) => "alias",
        }
    }

    /// Text placed into a module body for this symbol.
    pub fn module_text(&self, with_comment: bool) -> String {
        match self {
            Symbol::Entity(e) => match (&e.leading_comment, with_comment) {
                (Some(comment), true) => format!("{}\n\n{}", comment, e.body_text),
                _ => e.body_text.clone(),
            },
            Symbol::Alias(a) => a.body_text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entities: Vec<Entity>,
    aliases: Vec<DerivedAlias>,
    order: Vec<Slot>,
    by_name: FxHashMap<String, Slot>,
}

impl Catalog {
    /// Build a catalog; symbols are ordered by source offset.
    ///
    /// Name uniqueness is checked by the extractor before this is called.
    pub fn new(entities: Vec<Entity>, mut aliases: Vec<DerivedAlias>) -> Self {
        for alias in &mut aliases {
            alias.resolved = entities.iter().any(|e| e.name == alias.referenced_entity);
        }

        let mut order: Vec<(usize, Slot)> = entities
            .iter()
            .enumerate()
            .map(|(i, e)| (e.offset, Slot::Entity(i)))
            .chain(
                aliases
                    .iter()
                    .enumerate()
                    .map(|(i, a)| (a.offset, Slot::Alias(i))),
            )
            .collect();
        order.sort_by_key(|(offset, _)| *offset);
        let order: Vec<Slot> = order.into_iter().map(|(_, slot)| slot).collect();

        let mut by_name = FxHashMap::default();
        for slot in &order {
            let name = match slot {
                Slot::Entity(i) => entities[*i].name.clone(),
                Slot::Alias(i) => aliases[*i].name.clone(),
            };
            by_name.insert(name, *slot);
        }

        Self {
            entities,
            aliases,
            order,
            by_name,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn aliases(&self) -> &[DerivedAlias] {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn resolve(&self, slot: Slot) -> Symbol<'_> {
        match slot {
            Slot::Entity(i) => Symbol::Entity(&self.entities[i]),
            Slot::Alias(i) => Symbol::Alias(&self.aliases[i]),
        }
    }

    /// All symbols in discovery (source) order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol<'_>> + '_ {
        self.order.iter().map(|slot| self.resolve(*slot))
    }

    pub fn get(&self, name: &str) -> Option<Symbol<'_>> {
        self.by_name.get(name).map(|slot| self.resolve(*slot))
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        match self.by_name.get(name) {
            Some(Slot::Entity(i)) => Some(&self.entities[*i]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, offset: usize) -> Entity {
        Entity {
            name: name.to_string(),
            physical_name: name.to_string(),
            body_text: format!("export const {} = mysqlTable(\"{}\", {{}});", name, name),
            leading_comment: None,
            offset,
        }
    }

    fn alias(name: &str, target: &str, offset: usize) -> DerivedAlias {
        DerivedAlias {
            name: name.to_string(),
            referenced_entity: target.to_string(),
            shape: Shape::Read,
            body_text: format!("export type {} = typeof {}.$inferSelect;", name, target),
            resolved: false,
            offset,
        }
    }

    #[test]
    fn symbols_follow_source_order() {
        let catalog = Catalog::new(
            vec![entity("users", 0), entity("deals", 100)],
            vec![alias("User", "users", 50), alias("Deal", "deals", 150)],
        );
        let names: Vec<&str> = catalog.symbols().map(|s| s.name()).collect();
        assert_eq!(names, vec!["users", "User", "deals", "Deal"]);
    }

    #[test]
    fn alias_resolution_is_computed() {
        let catalog = Catalog::new(
            vec![entity("users", 0)],
            vec![alias("User", "users", 10), alias("Ghost", "ghosts", 20)],
        );
        assert!(catalog.aliases()[0].resolved);
        assert!(!catalog.aliases()[1].resolved);
    }

    #[test]
    fn leading_comment_is_optional_in_module_text() {
        let mut e = entity("users", 0);
        e.leading_comment = Some("// USERS".to_string());
        let sym = Symbol::Entity(&e);
        assert!(sym.module_text(true).starts_with("// USERS\n\nexport const users"));
        assert!(sym.module_text(false).starts_with("export const users"));
    }
}
