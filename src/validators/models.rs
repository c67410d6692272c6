//! Content model matching
//!
//! Child elements are matched against a particle by simulating the set of
//! positions reachable after each term. Every reachable position keeps the
//! declarations bound to the children consumed so far, as a path that shares
//! its prefix with the path it was extended from. The furthest position
//! reached, and the names that could have been consumed there, become the
//! diagnostic when matching fails.

use crate::documents::Element;
use crate::error::{Error, Result};
use crate::namespaces::QName;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use super::elements::XsdElement;
use super::groups::{GroupParticle, ModelType, Particle, XsdGroup};
use super::schemas::XsdSchema;
use super::wildcards::ProcessContents;

/// How a child element was matched
#[derive(Debug, Clone)]
pub enum Binding {
    /// Matched an element declaration
    Element(Arc<XsdElement>),
    /// Matched a wildcard
    Wildcard(ProcessContents),
}

/// Outcome of matching the children of an element
#[derive(Debug, Clone)]
pub enum ContentMatch {
    /// Every child matched and the content is complete
    Complete(Vec<Binding>),
    /// The child at `index` cannot appear there
    Unexpected {
        /// Position of the first child that could not be matched
        index: usize,
        /// Bindings of the children before `index`
        bindings: Vec<Binding>,
        /// Names that were acceptable at `index`
        expected: Vec<String>,
    },
    /// All children matched but required content is missing
    Incomplete {
        /// Bindings of every child
        bindings: Vec<Binding>,
        /// Names that were acceptable after the last child
        expected: Vec<String>,
    },
}

/// One link of the bindings along a matching path, newest first
///
/// Paths share their prefixes, so extending one is constant time.
#[derive(Debug)]
struct Trail {
    binding: Binding,
    prev: Path,
}

type Path = Option<Rc<Trail>>;

impl Drop for Trail {
    // Unlink iteratively; long child lists would otherwise drop recursively
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(link) = prev {
            match Rc::try_unwrap(link) {
                Ok(mut trail) => prev = trail.prev.take(),
                Err(_) => break,
            }
        }
    }
}

fn extend(path: &Path, binding: Binding) -> Path {
    Some(Rc::new(Trail {
        binding,
        prev: path.clone(),
    }))
}

/// Bindings of a path in document order
fn collect(path: &Path) -> Vec<Binding> {
    let mut bindings = Vec::new();
    let mut link = path.as_deref();
    while let Some(trail) = link {
        bindings.push(trail.binding.clone());
        link = trail.prev.as_deref();
    }
    bindings.reverse();
    bindings
}

/// Reachable positions, each with the path that reached it first
type States = IndexMap<usize, Path>;

/// Match children against a content particle
pub fn match_content(
    particle: Option<&Particle>,
    children: &[Element],
    schema: &XsdSchema,
) -> Result<ContentMatch> {
    let mut matcher = ContentMatcher {
        schema,
        children,
        furthest: 0,
        furthest_path: None,
        expected: Vec::new(),
    };

    let mut start = States::new();
    start.insert(0, None);
    let end = match particle {
        Some(particle) => matcher.particle(particle, &start, 0)?,
        None => start,
    };

    if let Some(path) = end.get(&children.len()) {
        return Ok(ContentMatch::Complete(collect(path)));
    }
    let bindings = collect(&matcher.furthest_path);
    if matcher.furthest < children.len() {
        Ok(ContentMatch::Unexpected {
            index: matcher.furthest,
            bindings,
            expected: matcher.expected,
        })
    } else {
        Ok(ContentMatch::Incomplete {
            bindings,
            expected: matcher.expected,
        })
    }
}

struct ContentMatcher<'a> {
    schema: &'a XsdSchema,
    children: &'a [Element],
    furthest: usize,
    furthest_path: Path,
    expected: Vec<String>,
}

impl<'a> ContentMatcher<'a> {
    fn particle(&mut self, particle: &Particle, states: &States, depth: usize) -> Result<States> {
        let occurs = particle.occurs;
        let mut results = States::new();
        if occurs.is_emptiable() {
            merge(&mut results, states.clone());
        }
        if occurs.is_empty() {
            return Ok(results);
        }

        // Once minOccurs is satisfied, a position already expanded reaches
        // nothing new, so each one is expanded at most once.
        let mut expanded = HashSet::new();
        let mut current = states.clone();
        let mut count: u32 = 0;
        loop {
            count += 1;
            let satisfied = count >= occurs.min;
            let mut next = States::new();
            for (pos, path) in &current {
                if satisfied && !expanded.insert(*pos) {
                    continue;
                }
                let reached = self.term(&particle.term, *pos, path, depth)?;
                merge(&mut next, reached);
            }
            if next.is_empty() {
                break;
            }

            let fixpoint = next.len() == current.len() && next.keys().all(|k| current.contains_key(k));
            if satisfied || fixpoint {
                // A repeated position set means the remaining repetitions can all match empty
                merge(&mut results, next.clone());
            }
            if fixpoint || occurs.is_over(count) {
                break;
            }
            current = next;
        }
        Ok(results)
    }

    fn term(&mut self, term: &GroupParticle, pos: usize, path: &Path, depth: usize) -> Result<States> {
        match term {
            GroupParticle::Element(_) | GroupParticle::ElementRef(_) | GroupParticle::Any(_) => {
                let mut states = States::new();
                match self.single(term, pos)? {
                    Some(binding) => {
                        let extended = extend(path, binding);
                        self.reach(pos + 1, &extended);
                        states.insert(pos + 1, extended);
                    }
                    None => {
                        let name = self.describe(term)?;
                        self.expect(pos, name, path);
                    }
                }
                Ok(states)
            }
            GroupParticle::Group(group) => self.group(group, pos, path, depth),
            GroupParticle::GroupRef(name) => {
                self.schema.limits.check_model_depth(depth + 1)?;
                let group = self.schema.lookup_group(name).ok_or_else(|| {
                    Error::Schema(format!("Reference to undeclared group '{}'", name))
                })?;
                self.group(group, pos, path, depth + 1)
            }
        }
    }

    fn group(&mut self, group: &XsdGroup, pos: usize, path: &Path, depth: usize) -> Result<States> {
        let mut start = States::new();
        start.insert(pos, path.clone());

        match group.model {
            ModelType::Sequence => {
                let mut states = start;
                for particle in &group.particles {
                    states = self.particle(particle, &states, depth)?;
                    if states.is_empty() {
                        break;
                    }
                }
                Ok(states)
            }
            ModelType::Choice => {
                let mut states = States::new();
                for particle in &group.particles {
                    let reached = self.particle(particle, &start, depth)?;
                    merge(&mut states, reached);
                }
                Ok(states)
            }
            ModelType::All => self.all(group, pos, path),
        }
    }

    /// `xs:all`: each particle at most once, in any order
    fn all(&mut self, group: &XsdGroup, pos: usize, path: &Path) -> Result<States> {
        let mut used = vec![false; group.particles.len()];
        let mut pos = pos;
        let mut path = path.clone();

        'children: while pos < self.children.len() {
            for (i, particle) in group.particles.iter().enumerate() {
                if used[i] || particle.occurs.is_empty() {
                    continue;
                }
                if let Some(binding) = self.single(&particle.term, pos)? {
                    used[i] = true;
                    path = extend(&path, binding);
                    pos += 1;
                    self.reach(pos, &path);
                    continue 'children;
                }
            }
            break;
        }

        let mut missing_required = false;
        for (i, particle) in group.particles.iter().enumerate() {
            if used[i] || particle.occurs.is_empty() {
                continue;
            }
            let name = self.describe(&particle.term)?;
            self.expect(pos, name, &path);
            missing_required |= !particle.occurs.is_emptiable();
        }

        let mut states = States::new();
        if !missing_required {
            states.insert(pos, path);
        }
        Ok(states)
    }

    /// Try to consume the child at `pos` with an element or wildcard term
    fn single(&self, term: &GroupParticle, pos: usize) -> Result<Option<Binding>> {
        let Some(child) = self.children.get(pos) else {
            return Ok(None);
        };
        Ok(match term {
            GroupParticle::Element(decl) => {
                (decl.name == child.qname).then(|| Binding::Element(decl.clone()))
            }
            GroupParticle::ElementRef(name) => {
                let decl = self.global_element(name)?;
                (decl.name == child.qname).then(|| Binding::Element(decl.clone()))
            }
            GroupParticle::Any(wildcard) => wildcard
                .matches(&child.qname)
                .then_some(Binding::Wildcard(wildcard.process_contents)),
            GroupParticle::Group(_) | GroupParticle::GroupRef(_) => None,
        })
    }

    fn global_element(&self, name: &QName) -> Result<&'a Arc<XsdElement>> {
        self.schema
            .lookup_element(name)
            .ok_or_else(|| Error::Schema(format!("Reference to undeclared element '{}'", name)))
    }

    fn describe(&self, term: &GroupParticle) -> Result<String> {
        Ok(match term {
            GroupParticle::Element(decl) => decl.name.to_string(),
            GroupParticle::ElementRef(name) => self.global_element(name)?.name.to_string(),
            GroupParticle::Any(wildcard) => wildcard.to_string(),
            GroupParticle::Group(_) | GroupParticle::GroupRef(_) => String::new(),
        })
    }

    fn reach(&mut self, pos: usize, path: &Path) {
        if pos > self.furthest {
            self.furthest = pos;
            self.furthest_path = path.clone();
            self.expected.clear();
        }
    }

    fn expect(&mut self, pos: usize, name: String, path: &Path) {
        self.reach(pos, path);
        if pos == self.furthest && !name.is_empty() && !self.expected.contains(&name) {
            if self.expected.is_empty() {
                self.furthest_path = path.clone();
            }
            self.expected.push(name);
        }
    }
}

fn merge(into: &mut States, from: States) {
    for (pos, path) in from {
        into.entry(pos).or_insert(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;
    use crate::validators::complex_types::ContentType;
    use crate::validators::schemas::TypeDef;

    fn schema(content: &str) -> XsdSchema {
        let xsd = format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                <xs:element name="root"><xs:complexType>{}</xs:complexType></xs:element>
                <xs:element name="g" type="xs:string"/>
                <xs:group name="pair">
                    <xs:sequence><xs:element name="p" type="xs:string"/><xs:element name="q" type="xs:string"/></xs:sequence>
                </xs:group>
            </xs:schema>"#,
            content
        );
        XsdSchema::from_string(&xsd).unwrap()
    }

    fn run(schema: &XsdSchema, xml: &str) -> ContentMatch {
        let doc = Document::from_string(xml).unwrap();
        let root = schema.lookup_element(&QName::local("root")).unwrap();
        let complex = match schema.resolve_type(&root.type_ref).unwrap() {
            TypeDef::Complex(c) => c,
            other => panic!("unexpected {:?}", other),
        };
        let effective = complex.effective(schema).unwrap();
        let particle = match effective.content {
            ContentType::Elements { particle, .. } => particle,
            _ => None,
        };
        match_content(particle.as_ref(), &doc.root.children, schema).unwrap()
    }

    fn is_complete(result: &ContentMatch, count: usize) -> bool {
        matches!(result, ContentMatch::Complete(b) if b.len() == count)
    }

    #[test]
    fn test_sequence_with_unbounded_element() {
        let schema = schema(
            r#"<xs:sequence><xs:element name="a" type="xs:string" maxOccurs="unbounded"/><xs:element name="b" type="xs:string" minOccurs="0"/></xs:sequence>"#,
        );
        assert!(is_complete(&run(&schema, "<root><a/><a/><a/><b/></root>"), 4));
        assert!(is_complete(&run(&schema, "<root><a/></root>"), 1));

        match run(&schema, "<root><a/><c/></root>") {
            ContentMatch::Unexpected { index, expected, bindings } => {
                assert_eq!(index, 1);
                assert_eq!(expected, vec!["a", "b"]);
                assert_eq!(bindings.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_child() {
        let schema = schema(
            r#"<xs:sequence><xs:element name="a" type="xs:string"/><xs:element name="b" type="xs:string"/></xs:sequence>"#,
        );
        match run(&schema, "<root><a/></root>") {
            ContentMatch::Incomplete { expected, .. } => assert_eq!(expected, vec!["b"]),
            other => panic!("unexpected {:?}", other),
        }
        match run(&schema, "<root/>") {
            ContentMatch::Incomplete { expected, .. } => assert_eq!(expected, vec!["a"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_choice_and_group_reference() {
        let schema = schema(
            r#"<xs:choice maxOccurs="2"><xs:element ref="g"/><xs:group ref="pair"/></xs:choice>"#,
        );
        assert!(is_complete(&run(&schema, "<root><g/><p/><q/></root>"), 3));
        match run(&schema, "<root><p/><g/></root>") {
            ContentMatch::Unexpected { index, expected, .. } => {
                assert_eq!(index, 1);
                assert_eq!(expected, vec!["q"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_all_group() {
        let schema = schema(
            r#"<xs:all><xs:element name="x" type="xs:string"/><xs:element name="y" type="xs:string" minOccurs="0"/></xs:all>"#,
        );
        assert!(is_complete(&run(&schema, "<root><y/><x/></root>"), 2));
        assert!(is_complete(&run(&schema, "<root><x/></root>"), 1));
        assert!(matches!(
            run(&schema, "<root><x/><x/></root>"),
            ContentMatch::Unexpected { index: 1, .. }
        ));
        assert!(matches!(run(&schema, "<root><y/></root>"), ContentMatch::Incomplete { .. }));
    }

    #[test]
    fn test_wildcard_binding() {
        let schema = schema(r#"<xs:sequence><xs:any processContents="lax" maxOccurs="unbounded"/></xs:sequence>"#);
        match run(&schema, "<root><anything/><else/></root>") {
            ContentMatch::Complete(bindings) => {
                assert!(bindings
                    .iter()
                    .all(|b| matches!(b, Binding::Wildcard(ProcessContents::Lax))));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_repeated_sequence_of_optional_lists() {
        let schema = schema(
            r#"<xs:sequence maxOccurs="unbounded"><xs:element name="a" type="xs:string" minOccurs="0" maxOccurs="unbounded"/><xs:element name="b" type="xs:string" minOccurs="0" maxOccurs="unbounded"/></xs:sequence>"#,
        );
        let xml = format!("<root>{}</root>", "<a/><b/>".repeat(2000));
        assert!(is_complete(&run(&schema, &xml), 4000));

        let xml = format!("<root>{}<c/></root>", "<b/><a/>".repeat(500));
        match run(&schema, &xml) {
            ContentMatch::Unexpected { index, bindings, expected } => {
                assert_eq!(index, 1000);
                assert_eq!(bindings.len(), 1000);
                assert_eq!(expected, vec!["a", "b"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_nested_bounded_repetitions() {
        let schema = schema(
            r#"<xs:sequence maxOccurs="100"><xs:sequence maxOccurs="100"><xs:element name="a" type="xs:string" minOccurs="0" maxOccurs="100"/></xs:sequence></xs:sequence>"#,
        );
        let xml = format!("<root>{}</root>", "<a/>".repeat(200));
        assert!(is_complete(&run(&schema, &xml), 200));
    }

    #[test]
    fn test_min_occurs_above_one() {
        let schema = schema(
            r#"<xs:sequence><xs:element name="a" type="xs:string" minOccurs="2" maxOccurs="3"/></xs:sequence>"#,
        );
        assert!(matches!(run(&schema, "<root><a/></root>"), ContentMatch::Incomplete { .. }));
        assert!(is_complete(&run(&schema, "<root><a/><a/></root>"), 2));
        assert!(is_complete(&run(&schema, "<root><a/><a/><a/></root>"), 3));
        match run(&schema, "<root><a/><a/><a/><a/></root>") {
            ContentMatch::Unexpected { index, expected, .. } => {
                assert_eq!(index, 3);
                assert!(expected.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
