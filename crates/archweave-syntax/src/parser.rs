//! Recursive descent parser for architecture sources.
//!
//! The grammar is keyword dispatched: every declaration starts with a
//! keyword (`package`, `import`, `data def`, `part def`, `part`, `connect`,
//! `requirement`) so one token of lookahead, occasionally two, is enough.
//! Statements end with `;` or `,`, or implicitly before a closing `}`.
//!
//! A syntax error aborts the file. Duplicate names within one scope are
//! collected and reported together once the file has been read; the first
//! declaration stays in the tree.

use std::collections::HashMap;

use archweave_core::{CompileError, DeclKind, PortDirection, SourceLocation, Value};

use crate::ast::{
    ConnectDecl, DataDef, DataKeyword, EndpointDecl, FieldDecl, ImportDecl, Item, Literal,
    PackageDecl, PartDef, PartUsageDecl, PortDecl, RequirementDecl, SyntaxTree, TypeExpr,
};
use crate::lexer::{tokenize, Token};
use crate::source::LineIndex;
use crate::stream::TokenStream;

type ParseResult<T> = Result<T, CompileError>;

/// Result of parsing one file.
///
/// `tree` is `None` only when a syntax error aborted the file. Duplicate
/// declarations leave the tree intact with the first declaration kept.
#[derive(Debug)]
pub struct Parsed {
    pub tree: Option<SyntaxTree>,
    pub errors: Vec<CompileError>,
}

/// Parse the text of one file, keeping the tree alongside any duplicate
/// diagnostics.
pub fn parse_file(file: &str, source: &str) -> Parsed {
    let lines = LineIndex::new(file, source);
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(span) => {
            let text = source.get(span.clone()).unwrap_or_default();
            return Parsed {
                tree: None,
                errors: vec![CompileError::SyntaxError {
                    location: lines.location(span.start),
                    found: format!("'{text}'"),
                    message: "unrecognized character sequence".to_string(),
                }],
            };
        }
    };

    let mut parser = Parser {
        stream: TokenStream::new(&tokens, &lines),
        duplicates: Vec::new(),
    };
    let result = parser.parse_items(false);
    let mut errors = parser.duplicates;
    match result {
        Ok(items) => Parsed {
            tree: Some(SyntaxTree {
                file: file.to_string(),
                items,
            }),
            errors,
        },
        Err(err) => {
            errors.push(err);
            Parsed { tree: None, errors }
        }
    }
}

/// Parse the text of one file, failing on any diagnostic.
///
/// On failure every duplicate declaration found before the failure is
/// returned, followed by the syntax error if there was one.
pub fn parse(file: &str, source: &str) -> Result<SyntaxTree, Vec<CompileError>> {
    match parse_file(file, source) {
        Parsed {
            tree: Some(tree),
            errors,
        } if errors.is_empty() => Ok(tree),
        Parsed { errors, .. } => Err(errors),
    }
}

/// Names declared so far in one package, part or data body.
#[derive(Default)]
struct Scope {
    seen: HashMap<(DeclKind, String), SourceLocation>,
}

struct Parser<'src> {
    stream: TokenStream<'src>,
    duplicates: Vec<CompileError>,
}

impl<'src> Parser<'src> {
    /// Record a name in `scope`. Returns `false` for a duplicate, which the
    /// caller drops so the first declaration wins.
    fn declare(&mut self, scope: &mut Scope, kind: DeclKind, name: &str, location: &SourceLocation) -> bool {
        match scope.seen.get(&(kind, name.to_string())) {
            Some(previous) => {
                self.duplicates.push(CompileError::duplicate(
                    kind,
                    name,
                    location.clone(),
                    previous.clone(),
                ));
                false
            }
            None => {
                scope
                    .seen
                    .insert((kind, name.to_string()), location.clone());
                true
            }
        }
    }

    /// End of a statement: `;`, `,`, or nothing before `}` / end of input.
    fn terminator(&mut self, context: &str) -> ParseResult<()> {
        if self.stream.eat(&Token::Semi) || self.stream.eat(&Token::Comma) {
            return Ok(());
        }
        if self.stream.at_end() || self.stream.check(&Token::RBrace) {
            return Ok(());
        }
        Err(self.stream.error(format!("expected ';' after {context}")))
    }

    // === Package level ===

    fn parse_items(&mut self, nested: bool) -> ParseResult<Vec<Item>> {
        let mut scope = Scope::default();
        let mut items = Vec::new();
        loop {
            match self.stream.peek() {
                None if nested => {
                    return Err(self.stream.error("expected '}' to close package".into()))
                }
                None => break,
                Some(Token::RBrace) if nested => break,
                Some(Token::Semi) | Some(Token::Doc(_)) => {
                    self.stream.advance();
                }
                Some(_) => {
                    let item = self.parse_item()?;
                    let fresh = match declared_name(&item) {
                        Some((kind, name, location)) => self.declare(&mut scope, kind, name, location),
                        None => true,
                    };
                    if fresh {
                        items.push(item);
                    }
                }
            }
        }
        Ok(items)
    }

    fn parse_item(&mut self) -> ParseResult<Item> {
        match self.stream.peek() {
            Some(Token::Package) => self.parse_package().map(Item::Package),
            Some(Token::Private) | Some(Token::Public) | Some(Token::Import) => {
                self.parse_import().map(Item::Import)
            }
            Some(Token::Data) | Some(Token::Attribute) | Some(Token::Port) => {
                self.parse_data_def().map(Item::DataDef)
            }
            Some(Token::Part) if self.stream.peek_nth(1) == Some(&Token::Def) => {
                self.parse_part_def().map(Item::PartDef)
            }
            Some(Token::Part) => self.parse_part_usage().map(Item::PartUsage),
            Some(Token::Connect) => self.parse_connect().map(Item::Connect),
            Some(Token::Requirement) => self.parse_requirement().map(Item::Requirement),
            Some(Token::Comment((identifier, text))) => {
                let location = self.stream.location();
                self.stream.advance();
                Ok(Item::Requirement(RequirementDecl {
                    identifier: identifier.clone(),
                    text: text.clone(),
                    metrics: Vec::new(),
                    location,
                }))
            }
            _ => Err(self.stream.error("expected declaration".into())),
        }
    }

    fn parse_package(&mut self) -> ParseResult<PackageDecl> {
        self.stream.expect(Token::Package, "")?;
        let (name, location) = self.stream.expect_ident("after 'package'")?;
        self.stream.expect(Token::LBrace, "to open package body")?;
        let items = self.parse_items(true)?;
        self.stream.expect(Token::RBrace, "to close package")?;
        Ok(PackageDecl {
            name,
            items,
            location,
        })
    }

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let location = self.stream.location();
        if !self.stream.eat(&Token::Private) {
            self.stream.eat(&Token::Public);
        }
        self.stream.expect(Token::Import, "")?;
        let (first, _) = self.stream.expect_ident("after 'import'")?;
        let mut path = vec![first];
        let mut wildcard = false;
        while self.stream.eat(&Token::ColonColon) {
            if self.stream.eat(&Token::Star) {
                wildcard = true;
                break;
            }
            let (segment, _) = self.stream.expect_ident("in import path")?;
            path.push(segment);
        }
        self.terminator("import")?;
        Ok(ImportDecl {
            path,
            wildcard,
            location,
        })
    }

    // === Data definitions ===

    fn parse_data_def(&mut self) -> ParseResult<DataDef> {
        let keyword = match self.stream.advance() {
            Some(Token::Data) => DataKeyword::Data,
            Some(Token::Attribute) => DataKeyword::Attribute,
            _ => DataKeyword::Port,
        };
        self.stream.expect(Token::Def, "to declare a data type")?;
        let (name, location) = self.stream.expect_ident("for data type name")?;
        self.stream.expect(Token::LBrace, "to open data type body")?;

        let mut scope = Scope::default();
        let mut fields: Vec<FieldDecl> = Vec::new();
        let mut doc = None;
        let mut pending_doc = None;
        loop {
            match self.stream.peek() {
                Some(Token::RBrace) => break,
                None => return Err(self.stream.error("expected '}' to close data type".into())),
                Some(Token::Doc(text)) => {
                    self.stream.advance();
                    if doc.is_none() && fields.is_empty() {
                        doc = Some(text.clone());
                    } else {
                        pending_doc = Some(text.clone());
                    }
                }
                Some(Token::Semi) | Some(Token::Comma) => {
                    self.stream.advance();
                }
                Some(_) => {
                    let field = self.parse_field(pending_doc.take())?;
                    if self.declare(&mut scope, DeclKind::Field, &field.name, &field.location) {
                        fields.push(field);
                    }
                }
            }
        }
        self.stream.expect(Token::RBrace, "to close data type")?;

        Ok(DataDef {
            keyword,
            name,
            fields,
            doc,
            location,
        })
    }

    /// `attribute? name (: Type)? (= default)?`
    fn parse_field(&mut self, doc: Option<String>) -> ParseResult<FieldDecl> {
        self.stream.eat(&Token::Attribute);
        let (name, location) = self.stream.expect_ident("for field name")?;
        let ty = if self.stream.eat(&Token::Colon) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let default = if self.stream.eat(&Token::Eq) {
            Some(self.parse_literal()?)
        } else {
            None
        };
        self.terminator("field declaration")?;
        Ok(FieldDecl {
            name,
            ty,
            default,
            doc,
            location,
        })
    }

    fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let location = self.stream.location();
        let name = self.parse_qualified_name("for type name")?;
        let array_len = if self.stream.eat(&Token::LBracket) {
            let len = match self.stream.peek() {
                Some(Token::Integer(n)) => usize::try_from(*n).ok(),
                _ => None,
            };
            let Some(len) = len else {
                return Err(self
                    .stream
                    .error("array length must be a non-negative integer".into()));
            };
            self.stream.advance();
            self.stream.expect(Token::RBracket, "to close array length")?;
            Some(len)
        } else {
            None
        };
        Ok(TypeExpr {
            name,
            array_len,
            location,
        })
    }

    fn parse_qualified_name(&mut self, context: &str) -> ParseResult<String> {
        let (mut name, _) = self.stream.expect_ident(context)?;
        while self.stream.check(&Token::ColonColon)
            && matches!(self.stream.peek_nth(1), Some(Token::Ident(_)))
        {
            self.stream.advance();
            let (segment, _) = self.stream.expect_ident(context)?;
            name.push_str("::");
            name.push_str(&segment);
        }
        Ok(name)
    }

    fn parse_literal(&mut self) -> ParseResult<Literal> {
        if !self.stream.eat(&Token::LBracket) {
            return self.parse_value().map(Literal::Scalar);
        }
        let mut values = Vec::new();
        while !self.stream.eat(&Token::RBracket) {
            values.push(self.parse_value()?);
            if !self.stream.eat(&Token::Comma) {
                self.stream.expect(Token::RBracket, "to close default list")?;
                break;
            }
        }
        Ok(Literal::List(values))
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        let negative = self.stream.eat(&Token::Minus);
        let value = match self.stream.peek() {
            Some(Token::Integer(n)) => Value::Integer(if negative { -n } else { *n }),
            Some(Token::Real(x)) => Value::Real(if negative { -x } else { *x }),
            Some(Token::True) if !negative => Value::Boolean(true),
            Some(Token::False) if !negative => Value::Boolean(false),
            Some(Token::Str(s)) if !negative => Value::String(s.clone()),
            _ => return Err(self.stream.error("expected literal value".into())),
        };
        self.stream.advance();
        Ok(value)
    }

    // === Part definitions ===

    fn parse_part_def(&mut self) -> ParseResult<PartDef> {
        self.stream.expect(Token::Part, "")?;
        self.stream.expect(Token::Def, "")?;
        let (name, location) = self.stream.expect_ident("for part definition name")?;
        self.stream.expect(Token::LBrace, "to open part definition body")?;

        let mut def = PartDef {
            name,
            ports: Vec::new(),
            attributes: Vec::new(),
            parts: Vec::new(),
            connections: Vec::new(),
            doc: None,
            location,
        };
        let mut scope = Scope::default();
        let mut pending_doc = None;
        loop {
            let doc = match self.stream.peek() {
                Some(Token::RBrace) => break,
                None => {
                    return Err(self
                        .stream
                        .error("expected '}' to close part definition".into()))
                }
                Some(Token::Doc(text)) => {
                    self.stream.advance();
                    let empty = def.ports.is_empty()
                        && def.attributes.is_empty()
                        && def.parts.is_empty()
                        && def.connections.is_empty();
                    if def.doc.is_none() && empty {
                        def.doc = Some(text.clone());
                    } else {
                        pending_doc = Some(text.clone());
                    }
                    continue;
                }
                Some(Token::Semi) | Some(Token::Comma) => {
                    self.stream.advance();
                    continue;
                }
                Some(_) => pending_doc.take(),
            };

            match self.stream.peek() {
                Some(Token::In) | Some(Token::Out) => {
                    let port = self.parse_port(doc)?;
                    if self.declare(&mut scope, DeclKind::Port, &port.name, &port.location) {
                        def.ports.push(port);
                    }
                }
                Some(Token::Attribute) => {
                    let attr = self.parse_field(doc)?;
                    if self.declare(&mut scope, DeclKind::Attribute, &attr.name, &attr.location) {
                        def.attributes.push(attr);
                    }
                }
                Some(Token::Part) if self.stream.peek_nth(1) == Some(&Token::Def) => {
                    return Err(self
                        .stream
                        .error("part definitions cannot be nested".into()));
                }
                Some(Token::Part) => {
                    let usage = self.parse_part_usage()?;
                    if self.declare(&mut scope, DeclKind::PartUsage, &usage.name, &usage.location) {
                        def.parts.push(usage);
                    }
                }
                Some(Token::Connect) => {
                    let connection = self.parse_connect()?;
                    def.connections.push(connection);
                }
                _ => {
                    return Err(self.stream.error(
                        "expected port, attribute, part or connect in part definition".into(),
                    ))
                }
            }
        }
        self.stream.expect(Token::RBrace, "to close part definition")?;
        Ok(def)
    }

    /// `in|out port? name : Type`
    fn parse_port(&mut self, doc: Option<String>) -> ParseResult<PortDecl> {
        let direction = match self.stream.advance() {
            Some(Token::Out) => PortDirection::Out,
            _ => PortDirection::In,
        };
        if self.stream.peek_nth(1) != Some(&Token::Colon) {
            self.stream.eat(&Token::Port);
        }
        // Keywords are valid port names, as in connection endpoints.
        let (name, location) = self.stream.expect_name("for port name")?;
        self.stream.expect(Token::Colon, "after port name")?;
        let ty = self.parse_type()?;
        if ty.array_len.is_some() {
            return Err(CompileError::SyntaxError {
                location: ty.location,
                found: format!("'{}'", ty.name),
                message: "port types cannot be arrays".to_string(),
            });
        }
        self.terminator("port declaration")?;
        Ok(PortDecl {
            name,
            direction,
            ty,
            doc,
            location,
        })
    }

    fn parse_part_usage(&mut self) -> ParseResult<PartUsageDecl> {
        self.stream.expect(Token::Part, "")?;
        let (name, location) = self.stream.expect_ident("for part name")?;
        self.stream.expect(Token::Colon, "after part name")?;
        let definition = self.parse_qualified_name("for part definition")?;
        self.terminator("part usage")?;
        Ok(PartUsageDecl {
            name,
            definition,
            location,
        })
    }

    fn parse_connect(&mut self) -> ParseResult<ConnectDecl> {
        let location = self.stream.location();
        self.stream.expect(Token::Connect, "")?;
        let from = self.parse_endpoint()?;
        self.stream.expect(Token::To, "between connection endpoints")?;
        let to = self.parse_endpoint()?;
        self.terminator("connection")?;
        Ok(ConnectDecl { from, to, location })
    }

    fn parse_endpoint(&mut self) -> ParseResult<EndpointDecl> {
        let (usage, location) = self.stream.expect_ident("for connection endpoint")?;
        self.stream.expect(Token::Dot, "between part and port")?;
        let (port, _) = self.stream.expect_name("for port name")?;
        Ok(EndpointDecl {
            usage,
            port,
            location,
        })
    }

    // === Requirements ===

    fn parse_requirement(&mut self) -> ParseResult<RequirementDecl> {
        self.stream.expect(Token::Requirement, "")?;
        self.stream.eat(&Token::Def);
        let (identifier, location) = self.stream.expect_ident("for requirement identifier")?;
        let mut texts = Vec::new();
        let mut metrics = Vec::new();
        if let Some(Token::Str(text)) = self.stream.peek() {
            texts.push(text.clone());
            self.stream.advance();
        }

        if !self.stream.eat(&Token::LBrace) {
            self.terminator("requirement")?;
            return Ok(RequirementDecl {
                identifier,
                text: texts.join(" "),
                metrics,
                location,
            });
        }
        loop {
            match self.stream.peek() {
                Some(Token::RBrace) => break,
                Some(Token::Doc(text)) => {
                    texts.push(text.clone());
                    self.stream.advance();
                }
                Some(Token::Semi) | Some(Token::Comma) => {
                    self.stream.advance();
                }
                Some(Token::Metric) => {
                    self.stream.advance();
                    let (metric, _) = self.stream.expect_ident("for metric name")?;
                    self.terminator("metric")?;
                    metrics.push(metric);
                }
                _ => {
                    return Err(self
                        .stream
                        .error("expected doc comment or metric in requirement".into()))
                }
            }
        }
        self.stream.expect(Token::RBrace, "to close requirement")?;
        Ok(RequirementDecl {
            identifier,
            text: texts.join(" "),
            metrics,
            location,
        })
    }
}

fn declared_name(item: &Item) -> Option<(DeclKind, &str, &SourceLocation)> {
    match item {
        Item::DataDef(d) => Some((DeclKind::DataType, &d.name, &d.location)),
        Item::PartDef(d) => Some((DeclKind::PartDef, &d.name, &d.location)),
        Item::PartUsage(u) => Some((DeclKind::PartUsage, &u.name, &u.location)),
        Item::Requirement(r) => Some((DeclKind::Requirement, &r.identifier, &r.location)),
        Item::Package(_) | Item::Import(_) | Item::Connect(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use archweave_core::Value;

    fn parse_ok(source: &str) -> SyntaxTree {
        parse("test.sysml", source).unwrap()
    }

    fn parse_err(source: &str) -> Vec<CompileError> {
        parse("test.sysml", source).unwrap_err()
    }

    fn only_package(tree: &SyntaxTree) -> &PackageDecl {
        match &tree.items[..] {
            [Item::Package(p)] => p,
            other => panic!("expected one package, got {other:?}"),
        }
    }

    #[test]
    fn empty_file_parses() {
        assert!(parse_ok("").items.is_empty());
        assert!(parse_ok("// nothing here\n").items.is_empty());
    }

    #[test]
    fn data_def_fields() {
        let tree = parse_ok(
            "package Nav {
                data def Vec3 {
                    doc /* Cartesian vector */
                    x : Real; y : float64, z;
                    doc /* sample history */
                    samples : Real[10] = 0.0;
                    flags : Boolean[2] = [true, false]
                }
            }",
        );
        let pkg = only_package(&tree);
        let Item::DataDef(vec3) = &pkg.items[0] else {
            panic!("expected data def");
        };
        assert_eq!(vec3.keyword, DataKeyword::Data);
        assert_eq!(vec3.doc.as_deref(), Some("Cartesian vector"));
        let names: Vec<_> = vec3.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "z", "samples", "flags"]);
        assert!(vec3.fields[2].ty.is_none());
        let samples = &vec3.fields[3];
        assert_eq!(samples.doc.as_deref(), Some("sample history"));
        let ty = samples.ty.as_ref().unwrap();
        assert_eq!((ty.name.as_str(), ty.array_len), ("Real", Some(10)));
        assert_eq!(samples.default, Some(Literal::Scalar(Value::Real(0.0))));
        assert_eq!(
            vec3.fields[4].default,
            Some(Literal::List(vec![Value::Boolean(true), Value::Boolean(false)]))
        );
    }

    #[test]
    fn attribute_and_port_defs_declare_data_types() {
        let tree = parse_ok(
            "attribute def Gain { k = 2 }
             port def Cmd { attribute speed : Real; attribute mode : Integer = -1; }",
        );
        let Item::DataDef(gain) = &tree.items[0] else {
            panic!("expected data def");
        };
        assert_eq!(gain.keyword, DataKeyword::Attribute);
        assert_eq!(gain.fields[0].default, Some(Literal::Scalar(Value::Integer(2))));
        let Item::DataDef(cmd) = &tree.items[1] else {
            panic!("expected data def");
        };
        assert_eq!(cmd.keyword, DataKeyword::Port);
        assert_eq!(
            cmd.fields[1].default,
            Some(Literal::Scalar(Value::Integer(-1)))
        );
    }

    #[test]
    fn part_def_members() {
        let tree = parse_ok(
            "part def Rover {
                doc /* Top-level vehicle */
                in port cmd : Nav::Vec3;
                out pose : Pose;
                attribute waypointX_km : Real[10] = 0.0;
                part imu : Sensors::Imu;
                part nav : Navigator;
                connect imu.out to nav.in;
            }",
        );
        let Item::PartDef(rover) = &tree.items[0] else {
            panic!("expected part def");
        };
        assert_eq!(rover.doc.as_deref(), Some("Top-level vehicle"));
        assert_eq!(rover.ports.len(), 2);
        assert_eq!(rover.ports[0].direction, PortDirection::In);
        assert_eq!(rover.ports[0].ty.name, "Nav::Vec3");
        assert_eq!(rover.ports[1].direction, PortDirection::Out);
        assert_eq!(rover.attributes[0].name, "waypointX_km");
        assert_eq!(rover.parts[0].definition, "Sensors::Imu");
        let conn = &rover.connections[0];
        assert_eq!((conn.from.usage.as_str(), conn.from.port.as_str()), ("imu", "out"));
        assert_eq!((conn.to.usage.as_str(), conn.to.port.as_str()), ("nav", "in"));
    }

    #[test]
    fn keyword_port_names_declare_and_connect() {
        let tree = parse_ok(
            "part def Imu { out out : Vec3; in port : Cmd; out port data : Vec3; }
            part def Nav { in in : Vec3; }
            part imu : Imu;
            part nav : Nav;
            connect imu.out to nav.in;",
        );
        let Item::PartDef(imu) = &tree.items[0] else {
            panic!("expected part def");
        };
        let names: Vec<_> = imu.ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["out", "port", "data"]);
        let Item::PartDef(nav) = &tree.items[1] else {
            panic!("expected part def");
        };
        assert_eq!(nav.ports[0].name, "in");
        let Item::Connect(conn) = &tree.items[4] else {
            panic!("expected connect");
        };
        assert_eq!(conn.from.port, imu.ports[0].name);
        assert_eq!(conn.to.port, nav.ports[0].name);
    }

    #[test]
    fn package_level_usages_and_connections() {
        let tree = parse_ok(
            "package System {
                private import Nav::*;
                import Sensors::Imu;
                part imu : Imu;
                part ctl : Controller;
                connect imu.accel to ctl.accel;
            }",
        );
        let pkg = only_package(&tree);
        let Item::Import(glob) = &pkg.items[0] else {
            panic!("expected import");
        };
        assert_eq!(glob.path, ["Nav"]);
        assert!(glob.wildcard);
        let Item::Import(single) = &pkg.items[1] else {
            panic!("expected import");
        };
        assert_eq!(single.path, ["Sensors", "Imu"]);
        assert!(!single.wildcard);
        assert!(matches!(pkg.items[4], Item::Connect(_)));
    }

    #[test]
    fn requirement_forms() {
        let tree = parse_ok(
            "requirement def REQ_1 {
                doc /* Position error shall stay
                       below 2 m. */
                metric position_error;
            }
            requirement REQ_2 \"Shall log telemetry.\";
            comment REQ_3 /* Shall stop on fault. */",
        );
        let reqs: Vec<_> = tree
            .items
            .iter()
            .map(|i| match i {
                Item::Requirement(r) => r,
                other => panic!("expected requirement, got {other:?}"),
            })
            .collect();
        assert_eq!(reqs[0].text, "Position error shall stay below 2 m.");
        assert_eq!(reqs[0].metrics, ["position_error"]);
        assert_eq!(reqs[1].text, "Shall log telemetry.");
        assert_eq!(reqs[2].identifier, "REQ_3");
        assert_eq!(reqs[2].text, "Shall stop on fault.");
    }

    #[test]
    fn locations_point_at_names() {
        let tree = parse_ok("package P {\n  data def Vec3 { x }\n}");
        let pkg = only_package(&tree);
        let Item::DataDef(vec3) = &pkg.items[0] else {
            panic!("expected data def");
        };
        assert_eq!(vec3.location, SourceLocation::new("test.sysml", 2, 12));
        assert_eq!(vec3.fields[0].location.line, 2);
    }

    #[test]
    fn missing_semicolon_is_syntax_error() {
        let errors = parse_err("part def A { in x : T out y : T }\npart a : A part b : A");
        assert_eq!(errors.len(), 1);
        let CompileError::SyntaxError {
            location, message, ..
        } = &errors[0]
        else {
            panic!("expected syntax error");
        };
        assert_eq!(location.line, 1);
        assert!(message.contains("';'"), "{message}");
    }

    #[test]
    fn unclosed_package_reports_end_of_input() {
        let errors = parse_err("package P {\n data def T { x }\n");
        match &errors[0] {
            CompileError::SyntaxError { found, .. } => assert_eq!(found, "end of input"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unrecognized_character() {
        let errors = parse_err("data def T { x : Real @ }");
        assert_eq!(errors[0].kind(), "SyntaxError");
        assert_eq!(errors[0].location().column, 23);
    }

    #[test]
    fn negative_array_length_rejected() {
        let errors = parse_err("data def T { xs : Real[-1] }");
        assert!(errors[0].to_string().contains("non-negative"));
    }

    #[test]
    fn duplicates_in_one_scope_are_collected() {
        let errors = parse_err(
            "package P {
                data def Vec3 { x; x }
                data def Vec3 { y }
                part def A { in p : Vec3; out p : Vec3; }
            }",
        );
        let kinds: Vec<_> = errors
            .iter()
            .map(|e| match e {
                CompileError::DuplicateDeclaration { kind, name, .. } => (*kind, name.as_str()),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            kinds,
            [
                (DeclKind::Field, "x"),
                (DeclKind::DataType, "Vec3"),
                (DeclKind::Port, "p"),
            ]
        );
    }

    #[test]
    fn duplicates_keep_first_declaration_in_tree() {
        let parsed = parse_file(
            "a.sysml",
            "data def Vec3 { x } data def Vec3 { y } part def Sensor { out r : Vec3; out r : Vec3; }",
        );
        assert_eq!(parsed.errors.len(), 2);
        let tree = parsed.tree.unwrap();
        let [Item::DataDef(vec3), Item::PartDef(sensor)] = &tree.items[..] else {
            panic!("unexpected items {:?}", tree.items);
        };
        assert_eq!(vec3.fields[0].name, "x");
        assert_eq!(sensor.ports.len(), 1);
    }

    #[test]
    fn syntax_error_drops_tree() {
        let parsed = parse_file("a.sysml", "data def Vec3 { x } data def Vec3 { y } part def {");
        assert!(parsed.tree.is_none());
        assert_eq!(parsed.errors.len(), 2);
        assert_eq!(parsed.errors[1].kind(), "SyntaxError");
    }

    #[test]
    fn same_name_in_sibling_packages_is_not_a_duplicate() {
        parse_ok("package A { data def T { x } } package B { data def T { y } }");
    }

    #[test]
    fn same_name_different_kinds_is_allowed() {
        parse_ok("data def Imu { x } part def Imu { }");
    }

    #[test]
    fn zero_length_array() {
        let tree = parse_ok("data def Empty { xs : Integer[0] }");
        let Item::DataDef(def) = &tree.items[0] else {
            panic!("expected data def");
        };
        assert_eq!(def.fields[0].ty.as_ref().unwrap().array_len, Some(0));
    }
}
