use super::config::{ExportConfig, PoseFrame};
use super::error::{ParseErrorKind, SysmlError};
use super::lexer::{Token, TokenKind, tokenize};
use super::writer::{
    EXTERNAL_ID_ATTRIBUTE, LOCATION_ATTRIBUTE, ROTATION_ATTRIBUTE, SCALAR_ATTRIBUTES,
    TYPE_ID_ATTRIBUTE,
};
use crate::core::models::assembly::Assembly;
use crate::core::models::component::Component;
use crate::core::models::ids::ComponentId;
use crate::core::models::pose::Pose;
use nalgebra::Vector3;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(f64),
    Text(String),
    Tuple(Vec<f64>),
    Reference(String),
}

impl Value {
    fn describe(&self) -> String {
        match self {
            Value::Number(n) => format!("number {n}"),
            Value::Text(text) => format!("string \"{text}\""),
            Value::Tuple(values) => format!("tuple of {} values", values.len()),
            Value::Reference(name) => format!("reference '{name}'"),
        }
    }
}

#[derive(Debug)]
struct Attribute {
    name: String,
    value: Option<Value>,
    line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Document,
    Package,
    Definition,
    Part,
    /// The body of an attribute; parsed and ignored.
    Attribute,
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    name: String,
    line: usize,
    children: Vec<usize>,
    attributes: Vec<Attribute>,
}

/// The parsed element tree, stored flat. Index 0 is the document itself.
#[derive(Debug)]
struct Document {
    nodes: Vec<Node>,
}

impl Document {
    fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                name: String::new(),
                line: 1,
                children: Vec::new(),
                attributes: Vec::new(),
            }],
        }
    }

    fn add(&mut self, parent: usize, kind: NodeKind, name: String, line: usize) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node {
            kind,
            name,
            line,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        self.nodes[parent].children.push(index);
        index
    }

    fn children_of(&self, index: usize, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes[index]
            .children
            .iter()
            .map(|&child| &self.nodes[child])
            .filter(move |node| node.kind == kind)
    }

    /// Searches the document and its packages, outermost first, for the first child of `kind`
    /// accepted by `accept`.
    fn find_in_packages(&self, kind: NodeKind, accept: impl Fn(&Node) -> bool) -> Option<usize> {
        let mut pending = vec![0];
        while let Some(index) = pending.pop() {
            let node = &self.nodes[index];
            if let Some(&found) = node.children.iter().find(|&&child| {
                let child = &self.nodes[child];
                child.kind == kind && accept(child)
            }) {
                return Some(found);
            }
            pending.extend(
                node.children
                    .iter()
                    .rev()
                    .filter(|&&child| self.nodes[child].kind == NodeKind::Package),
            );
        }
        None
    }
}

/// Parses SysML text in the layout produced by the writer into an [`Assembly`].
///
/// The root is the first part usage inside the part definition named
/// [`ExportConfig::context_name`], or the first top-level part usage when there is none. Pose
/// attributes are read in either attribute style, with angles interpreted using the configured
/// convention and unit. With [`PoseFrame::World`] the attributes are taken as world poses and
/// converted back to poses relative to the parent.
///
/// # Errors
///
/// * [`SysmlError::Parse`] for syntax outside the supported subset.
/// * [`SysmlError::MissingRoot`] if no root part usage exists.
/// * [`SysmlError::Model`] if the parts do not form a valid assembly (e.g. duplicate sibling
///   names).
pub fn parse(source: &str, config: &ExportConfig) -> Result<Assembly, SysmlError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    let document = parser.document()?;

    let root_index = document
        .find_in_packages(NodeKind::Definition, |node| node.name == config.context_name)
        .and_then(|context| {
            document.nodes[context]
                .children
                .iter()
                .copied()
                .find(|&child| document.nodes[child].kind == NodeKind::Part)
        })
        .or_else(|| document.find_in_packages(NodeKind::Part, |_| true))
        .ok_or_else(|| SysmlError::MissingRoot {
            context: config.context_name.clone(),
        })?;
    let root = &document.nodes[root_index];
    let assembly_name = document
        .children_of(0, NodeKind::Package)
        .next()
        .map_or_else(|| root.name.clone(), |package| package.name.clone());

    let root_values = PartValues::read(root, config)?;
    let mut assembly = Assembly::new(&assembly_name, &root.name, root_values.pose);
    let root_id = assembly.root();
    root_values.apply(assembly.component_mut(root_id));

    let root_world = match config.pose_frame {
        PoseFrame::Local => None,
        PoseFrame::World => Some(root_values.pose),
    };
    build(&mut assembly, &document, root_index, root_id, root_world, config)?;
    debug!(
        components = assembly.len(),
        root = %root.name,
        "Parsed SysML assembly"
    );
    Ok(assembly)
}

/// Creates components for every part usage below `root_index`, in document order.
fn build(
    assembly: &mut Assembly,
    document: &Document,
    root_index: usize,
    root_id: ComponentId,
    root_world: Option<Pose>,
    config: &ExportConfig,
) -> Result<(), SysmlError> {
    let mut stack: Vec<(usize, ComponentId, Option<Pose>)> = parts_below(document, root_index)
        .map(|child| (child, root_id, root_world))
        .collect();

    while let Some((index, parent, parent_world)) = stack.pop() {
        let part = &document.nodes[index];
        let values = PartValues::read(part, config)?;
        let (local, world) = match parent_world {
            None => (values.pose, None),
            Some(parent_world) => (parent_world.inverse().compose(&values.pose), Some(values.pose)),
        };
        let id = assembly
            .create_component(&part.name, local, Some(parent))
            .map_err(|source| SysmlError::Model {
                line: part.line,
                source,
            })?;
        values.apply(assembly.component_mut(id));
        stack.extend(parts_below(document, index).map(|child| (child, id, world)));
    }
    Ok(())
}

/// Part usages directly below `index`, last first, ready to be pushed onto a stack.
fn parts_below(document: &Document, index: usize) -> impl Iterator<Item = usize> + '_ {
    document.nodes[index]
        .children
        .iter()
        .rev()
        .copied()
        .filter(move |&child| document.nodes[child].kind == NodeKind::Part)
}

struct PartValues {
    pose: Pose,
    type_id: Option<i64>,
    external_id: Option<String>,
}

impl PartValues {
    fn read(part: &Node, config: &ExportConfig) -> Result<Self, SysmlError> {
        let mut translation = Vector3::zeros();
        let mut angles = [0.0; 3];
        let mut type_id = None;
        let mut external_id = None;

        for attribute in &part.attributes {
            let Some(value) = &attribute.value else {
                continue;
            };
            let name = attribute.name.as_str();
            if let Some(index) = SCALAR_ATTRIBUTES.iter().position(|a| *a == name) {
                let number = expect_number(attribute, value)?;
                if index < 3 {
                    translation[index] = number;
                } else {
                    angles[index - 3] = number;
                }
            } else if name == LOCATION_ATTRIBUTE {
                translation = Vector3::from(expect_triple(attribute, value)?);
            } else if name == ROTATION_ATTRIBUTE {
                angles = expect_triple(attribute, value)?;
            } else if name == TYPE_ID_ATTRIBUTE {
                let number = expect_number(attribute, value)?;
                if number.fract() != 0.0 || number.abs() > i64::MAX as f64 {
                    return Err(invalid_attribute(attribute, "must be an integer"));
                }
                type_id = Some(number as i64);
            } else if name == EXTERNAL_ID_ATTRIBUTE {
                match value {
                    Value::Text(text) => external_id = Some(text.clone()),
                    other => {
                        return Err(invalid_attribute(
                            attribute,
                            &format!("must be a string, found {}", other.describe()),
                        ));
                    }
                }
            }
        }

        let unit = config.angle_unit;
        let radians = angles.map(|a| unit.to_radians(a));
        let pose = Pose::from_euler(translation, radians, config.euler_convention).map_err(
            |source| SysmlError::Model {
                line: part.line,
                source,
            },
        )?;
        Ok(Self {
            pose,
            type_id,
            external_id,
        })
    }

    fn apply(&self, component: Option<&mut Component>) {
        if let Some(component) = component {
            component.type_id = self.type_id;
            component.external_id = self.external_id.clone();
        }
    }
}

fn invalid_attribute(attribute: &Attribute, reason: &str) -> SysmlError {
    SysmlError::Parse {
        line: attribute.line,
        kind: ParseErrorKind::InvalidAttribute {
            name: attribute.name.clone(),
            reason: reason.to_string(),
        },
    }
}

fn expect_number(attribute: &Attribute, value: &Value) -> Result<f64, SysmlError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(invalid_attribute(
            attribute,
            &format!("must be a number, found {}", other.describe()),
        )),
    }
}

fn expect_triple(attribute: &Attribute, value: &Value) -> Result<[f64; 3], SysmlError> {
    match value {
        Value::Tuple(values) if values.len() == 3 => Ok([values[0], values[1], values[2]]),
        other => Err(invalid_attribute(
            attribute,
            &format!("must be a tuple of three numbers, found {}", other.describe()),
        )),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_symbol(&self, symbol: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Symbol(s)) if *s == symbol)
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(TokenKind::Word(w)) if w == word)
    }

    fn unexpected(&self, expected: &'static str) -> SysmlError {
        let kind = match self.peek() {
            Some(found) => ParseErrorKind::UnexpectedToken {
                expected,
                found: found.describe(),
            },
            None => ParseErrorKind::UnexpectedEof { expected },
        };
        SysmlError::Parse {
            line: self.line(),
            kind,
        }
    }

    fn expect_symbol(&mut self, symbol: &'static str) -> Result<(), SysmlError> {
        if self.at_symbol(symbol) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected(symbol))
        }
    }

    fn expect_name(&mut self) -> Result<(String, usize), SysmlError> {
        match self.peek() {
            Some(TokenKind::Word(_)) | Some(TokenKind::QuotedName(_)) => {}
            _ => return Err(self.unexpected("a name")),
        }
        match self.advance() {
            Some(Token {
                kind: TokenKind::Word(name) | TokenKind::QuotedName(name),
                line,
            }) => Ok((name, line)),
            _ => Err(self.unexpected("a name")),
        }
    }

    /// Qualified names such as `ScalarValues::Real` are collapsed to their last segment.
    fn expect_qualified_name(&mut self) -> Result<String, SysmlError> {
        let (mut name, _) = self.expect_name()?;
        while self.at_symbol("::") {
            self.pos += 1;
            if self.at_symbol("*") {
                self.pos += 1;
                name = "*".to_string();
                break;
            }
            name = self.expect_name()?.0;
        }
        Ok(name)
    }

    /// Parses the whole token stream. Nested bodies are tracked on an explicit stack of open
    /// nodes, so nesting depth is bounded only by memory.
    fn document(&mut self) -> Result<Document, SysmlError> {
        let mut document = Document::new();
        let mut open = vec![0];
        loop {
            let current = open.last().copied().unwrap_or(0);
            let braced = open.len() > 1;
            match self.peek() {
                None if braced => return Err(self.unexpected("'}'")),
                None => break,
                Some(TokenKind::Symbol("}")) if braced => {
                    self.pos += 1;
                    open.pop();
                }
                Some(TokenKind::Symbol(";")) => self.pos += 1,
                Some(TokenKind::Word(word)) => {
                    let (kind, name, line) = match word.as_str() {
                        "package" => {
                            self.pos += 1;
                            let (name, line) = self.expect_name()?;
                            (NodeKind::Package, name, line)
                        }
                        "part" => {
                            self.pos += 1;
                            let kind = if self.at_word("def") {
                                self.pos += 1;
                                NodeKind::Definition
                            } else {
                                NodeKind::Part
                            };
                            let (name, line) = self.expect_name()?;
                            self.skip_relationships()?;
                            (kind, name, line)
                        }
                        "attribute" => {
                            self.pos += 1;
                            let attribute = self.attribute()?;
                            let has_body = self.open_block()?;
                            let (name, line) = (attribute.name.clone(), attribute.line);
                            document.nodes[current].attributes.push(attribute);
                            if has_body {
                                let node =
                                    document.add(current, NodeKind::Attribute, name, line);
                                open.push(node);
                            }
                            continue;
                        }
                        "import" => {
                            self.pos += 1;
                            self.expect_qualified_name()?;
                            self.expect_symbol(";")?;
                            continue;
                        }
                        "public" | "private" | "protected" | "doc" => {
                            self.pos += 1;
                            continue;
                        }
                        _ => return Err(self.unexpected("'package', 'part' or 'attribute'")),
                    };
                    let node = document.add(current, kind, name, line);
                    if self.open_block()? {
                        open.push(node);
                    }
                }
                Some(_) => return Err(self.unexpected("'package', 'part' or 'attribute'")),
            }
        }
        Ok(document)
    }

    /// Consumes either `;` (an empty body, returns `false`) or `{` (returns `true`).
    fn open_block(&mut self) -> Result<bool, SysmlError> {
        if self.at_symbol(";") {
            self.pos += 1;
            return Ok(false);
        }
        self.expect_symbol("{")?;
        Ok(true)
    }

    /// Skips typing, specialization and multiplicity clauses up to the body.
    fn skip_relationships(&mut self) -> Result<(), SysmlError> {
        loop {
            if self.at_symbol(":") || self.at_symbol(":>") || self.at_symbol(":>>") {
                self.pos += 1;
                self.expect_qualified_name()?;
            } else if self.at_word("subsets")
                || self.at_word("redefines")
                || self.at_word("specializes")
            {
                self.pos += 1;
                self.expect_qualified_name()?;
            } else if self.at_symbol("[") {
                self.pos += 1;
                while !self.at_symbol("]") {
                    if self.advance().is_none() {
                        return Err(self.unexpected("']'"));
                    }
                }
                self.pos += 1;
            } else if self.at_symbol(",") {
                self.pos += 1;
            } else {
                return Ok(());
            }
        }
    }

    fn attribute(&mut self) -> Result<Attribute, SysmlError> {
        if self.at_symbol(":>>") || self.at_word("redefines") {
            self.pos += 1;
        }
        let (name, line) = self.expect_name()?;
        self.skip_relationships()?;
        let value = if self.at_symbol("=") {
            self.pos += 1;
            Some(self.value()?)
        } else {
            None
        };
        Ok(Attribute { name, value, line })
    }

    fn value(&mut self) -> Result<Value, SysmlError> {
        if self.at_symbol("(") {
            self.pos += 1;
            let mut values = Vec::new();
            if !self.at_symbol(")") {
                loop {
                    values.push(self.number()?);
                    if self.at_symbol(",") {
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
            }
            self.expect_symbol(")")?;
            return Ok(Value::Tuple(values));
        }
        match self.peek() {
            Some(TokenKind::String(_)) => match self.advance() {
                Some(Token {
                    kind: TokenKind::String(text),
                    ..
                }) => Ok(Value::Text(text)),
                _ => Err(self.unexpected("a string")),
            },
            Some(TokenKind::Word(_)) | Some(TokenKind::QuotedName(_)) => {
                Ok(Value::Reference(self.expect_qualified_name()?))
            }
            _ => Ok(Value::Number(self.number()?)),
        }
    }

    fn number(&mut self) -> Result<f64, SysmlError> {
        let negative = if self.at_symbol("-") {
            self.pos += 1;
            true
        } else {
            if self.at_symbol("+") {
                self.pos += 1;
            }
            false
        };
        let line = self.line();
        match self.peek() {
            Some(TokenKind::Number(_)) => {}
            _ => return Err(self.unexpected("a number")),
        }
        let Some(Token {
            kind: TokenKind::Number(text),
            ..
        }) = self.advance()
        else {
            return Err(self.unexpected("a number"));
        };
        let value: f64 = text.parse().map_err(|_| SysmlError::Parse {
            line,
            kind: ParseErrorKind::InvalidNumber(text.clone()),
        })?;
        Ok(if negative { -value } else { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::sysml::config::{AttributeStyle, ExportConfigBuilder};
    use crate::core::io::sysml::writer::export;
    use crate::core::models::error::ModelError;
    use crate::core::transforms::euler::{AngleUnit, EulerConvention};

    const TOLERANCE: f64 = 1e-9;

    fn sample() -> Assembly {
        let mut assembly = Assembly::new("MyStructure", "Robot", Pose::identity());
        let root = assembly.root();
        let arm_pose = Pose::from_euler(
            Vector3::new(0.5, 0.0, 1.25),
            [0.0, 0.3, 1.2],
            EulerConvention::sxyz(),
        )
        .unwrap();
        let arm = assembly.create_component("arm", arm_pose, Some(root)).unwrap();
        let gripper_pose = Pose::from_euler(
            Vector3::new(0.0, -0.2, 0.1),
            [0.7, 0.0, -0.4],
            EulerConvention::sxyz(),
        )
        .unwrap();
        let gripper = assembly
            .create_component("Gripper Tip", gripper_pose, Some(arm))
            .unwrap();
        let component = assembly.component_mut(gripper).unwrap();
        component.type_id = Some(3);
        component.external_id = Some("M+abc".to_string());
        assembly
            .create_component(
                "base",
                Pose::from_translation(Vector3::new(0.0, 0.0, -1.0)),
                Some(root),
            )
            .unwrap();
        assembly
    }

    fn assert_same_tree(expected: &Assembly, actual: &Assembly) {
        let left: Vec<_> = expected.depth_first().collect();
        let right: Vec<_> = actual.depth_first().collect();
        assert_eq!(left.len(), right.len());
        for ((d1, a), (d2, b)) in left.into_iter().zip(right) {
            assert_eq!(d1, d2);
            let a = expected.component(a).unwrap();
            let b = actual.component(b).unwrap();
            assert_eq!(a.name(), b.name());
            assert_eq!(a.type_id, b.type_id);
            assert_eq!(a.external_id, b.external_id);
            assert!(a.pose().approx_eq(b.pose(), TOLERANCE), "pose of {}", a.name());
        }
    }

    #[test]
    fn reads_back_written_text() {
        let assembly = sample();
        let config = ExportConfig::default();
        let text = export(&assembly, &config).unwrap();
        let parsed = parse(&text, &config).unwrap();
        assert_eq!(parsed.name(), "MyStructure");
        assert_same_tree(&assembly, &parsed);
    }

    #[test]
    fn reads_world_frame_vector_style_in_degrees() {
        let assembly = sample();
        let config = ExportConfigBuilder::new()
            .pose_frame(PoseFrame::World)
            .attribute_style(AttributeStyle::Vector)
            .angle_unit(AngleUnit::Degrees)
            .euler_convention(EulerConvention::parse("rzyx").unwrap())
            .build()
            .unwrap();
        let text = export(&assembly, &config).unwrap();
        let parsed = parse(&text, &config).unwrap();
        assert_same_tree(&assembly, &parsed);
    }

    #[test]
    fn falls_back_to_first_top_level_part() {
        let source = "
            // exported by hand
            part Rig : component {
                attribute :>> ID = \"root-1\";
                attribute :>> location = (1, 2, 3);
                attribute :>> rotation = (0, 0, 0);
                part Leg: component {
                    attribute :>> location = (0.5, 0, 0);
                    attribute :>> rotation = (0.0, 0.0, 0.0);
                }
            }
        ";
        let assembly = parse(source, &ExportConfig::default()).unwrap();
        assert_eq!(assembly.name(), "Rig");
        let root = assembly.component(assembly.root()).unwrap();
        assert_eq!(root.external_id.as_deref(), Some("root-1"));
        let leg = assembly.find_by_path(&["Leg"]).unwrap();
        let world = assembly.world_pose(leg).unwrap();
        assert!((world.translation() - Vector3::new(1.5, 2.0, 3.0)).norm() < TOLERANCE);
    }

    #[test]
    fn missing_root_is_reported() {
        let source = "package Empty { part def Component { attribute tx; } }";
        assert!(matches!(
            parse(source, &ExportConfig::default()),
            Err(SysmlError::MissingRoot { .. })
        ));
    }

    #[test]
    fn syntax_errors_carry_line_numbers() {
        let source = "package P {\n    part def Context {\n        part root : Component {\n            attribute :>> tx = ;\n        }\n    }\n}\n";
        match parse(source, &ExportConfig::default()) {
            Err(SysmlError::Parse { line, kind }) => {
                assert_eq!(line, 4);
                assert!(matches!(kind, ParseErrorKind::UnexpectedToken { .. }));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn unclosed_body_is_reported() {
        let source = "package P {\n    part root : Component {\n";
        assert!(matches!(
            parse(source, &ExportConfig::default()),
            Err(SysmlError::Parse {
                kind: ParseErrorKind::UnexpectedEof { .. },
                ..
            })
        ));
    }

    #[test]
    fn wrongly_typed_attribute_is_rejected() {
        let source = "part root { attribute :>> tx = \"one\"; }";
        assert!(matches!(
            parse(source, &ExportConfig::default()),
            Err(SysmlError::Parse {
                kind: ParseErrorKind::InvalidAttribute { .. },
                ..
            })
        ));
    }

    #[test]
    fn duplicate_sibling_names_are_model_errors() {
        let source = "part root {\n part a;\n part a;\n}";
        match parse(source, &ExportConfig::default()) {
            Err(SysmlError::Model { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(
                    source,
                    ModelError::DuplicateName {
                        name: "a".to_string()
                    }
                );
            }
            other => panic!("expected model error, got {other:?}"),
        }
    }

    #[test]
    fn deeply_nested_parts_are_read_without_recursion() {
        const DEPTH: usize = 20_000;
        let mut source = String::from("part root {\n");
        for level in 0..DEPTH {
            source.push_str(&format!("part p{level} {{ attribute :>> tz = 1.0;\n"));
        }
        source.push_str(&"}\n".repeat(DEPTH + 1));

        let assembly = parse(&source, &ExportConfig::default()).unwrap();
        assert_eq!(assembly.len(), DEPTH + 1);
        let (depth, deepest) = assembly.depth_first().last().unwrap();
        assert_eq!(depth, DEPTH);
        assert_eq!(
            assembly.component(deepest).unwrap().name(),
            format!("p{}", DEPTH - 1)
        );
        let world = assembly.world_pose(deepest).unwrap();
        assert!((world.translation().z - DEPTH as f64).abs() < TOLERANCE);
    }

    #[test]
    fn attribute_bodies_are_skipped() {
        let source = "part root {\n attribute :>> tx = 2.0 { attribute unit; }\n part leg;\n}";
        let assembly = parse(source, &ExportConfig::default()).unwrap();
        let root = assembly.component(assembly.root()).unwrap();
        assert!((root.pose().translation().x - 2.0).abs() < TOLERANCE);
        assert!(assembly.find_by_path(&["leg"]).is_some());
    }

    #[test]
    fn imports_and_declarations_without_values_are_accepted() {
        let source = "
            package Demo {
                private import ScalarValues::*;
                part def Context {
                    part root : Component[1] {
                        attribute :>> tz = 2.5;
                        attribute note : ScalarValues::Real;
                    }
                }
            }
        ";
        let assembly = parse(source, &ExportConfig::default()).unwrap();
        let root = assembly.component(assembly.root()).unwrap();
        assert_eq!(root.name(), "root");
        assert!((root.pose().translation().z - 2.5).abs() < TOLERANCE);
    }
}
