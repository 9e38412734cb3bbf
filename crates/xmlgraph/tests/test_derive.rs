use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use helios_xmlgraph::xml::{from_xml_str, read_text, to_xml_string};
use helios_xmlgraph::{
    ConverterChain, ConverterDescriptor, Result, XmlConfig, XmlGraph, XmlGraphError, XmlType,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::rc::Rc;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

fn compact() -> XmlGraph {
    XmlGraph::new().with_config(XmlConfig::new().with_xml_declaration(false))
}

#[derive(Debug, PartialEq, XmlType)]
struct Person {
    #[xml(element = "Name")]
    name: String,
    #[xml(attribute = "id")]
    id: u32,
}

#[derive(Debug, PartialEq, XmlType)]
struct Line {
    note: String,
    #[xml(attribute)]
    sku: String,
    qty: u32,
    #[xml(attribute)]
    unit: String,
}

#[derive(Debug, PartialEq, XmlType)]
struct Profile {
    nickname: Option<String>,
    tags: Vec<String>,
    #[xml(attribute)]
    level: Option<u8>,
    email: String,
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(constructor(Account::open, owner, balance))]
struct Account {
    owner: String,
    balance: Decimal,
    #[xml(ignore)]
    audit: Vec<String>,
}

impl Account {
    fn open(owner: String, balance: Decimal) -> Self {
        Self {
            owner,
            balance,
            audit: vec!["opened".to_string()],
        }
    }
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(constructor(Settings::new, name, retries))]
struct Settings {
    name: String,
    pub retries: u8,
}

impl Settings {
    fn new(name: String, _retries: u8) -> Self {
        Self {
            name: name.to_uppercase(),
            retries: 0,
        }
    }
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(factory(Celsius::from_kelvin, kelvin))]
struct Celsius {
    degrees: f64,
}

impl Celsius {
    fn from_kelvin(kelvin: f64) -> Self {
        Self {
            degrees: kelvin - 273.15,
        }
    }
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(rename_all = "kebab-case")]
enum Status {
    Active,
    OnHold,
    #[xml(rename = "gone")]
    Closed,
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(rename_all = "camelCase")]
struct Ticket {
    #[xml(attribute)]
    status: Status,
    first_reply: String,
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(root = "order", namespace = "urn:orders", prefix = "o")]
struct Order {
    #[xml(attribute)]
    id: u32,
    #[xml(element, namespace = "urn:orders", prefix = "o")]
    customer: String,
}

#[derive(Debug, PartialEq, XmlType)]
struct Money {
    #[xml(attribute)]
    currency: String,
    #[xml(text)]
    amount: Decimal,
}

#[derive(Debug, PartialEq, XmlType)]
#[xml(constructor(Price::new, amount, currency))]
struct Price {
    #[xml(attribute)]
    currency: String,
    #[xml(text)]
    amount: Decimal,
}

impl Price {
    fn new(amount: Decimal, currency: String) -> Self {
        Self { currency, amount }
    }
}

#[derive(Debug, PartialEq, XmlType)]
struct Note {
    #[xml(attribute)]
    id: u32,
    body: String,
}

#[derive(Debug, PartialEq, XmlType)]
struct Badge {
    #[xml(attribute = "badge id")]
    id: u32,
    #[xml(element = "1st-label")]
    label: String,
}

#[derive(Debug, PartialEq, XmlType)]
struct Event {
    title: String,
    when: DateTime<Utc>,
}

#[derive(Debug, XmlType)]
struct Link {
    label: String,
    next: OnceCell<Rc<Link>>,
}

#[derive(Debug, XmlType)]
struct Outer {
    inner: Inner,
}

#[derive(Debug, XmlType)]
struct Inner {
    value: u8,
}

#[test]
fn test_simple_object_round_trip() -> Result<()> {
    let person = Person {
        name: "x".to_string(),
        id: 7,
    };
    let xml = to_xml_string(&person)?;
    assert_eq!(xml, format!(r#"{DECLARATION}<Person id="7"><Name>x</Name></Person>"#));
    assert_eq!(from_xml_str::<Person>(&xml)?, person);
    Ok(())
}

#[test]
fn test_attributes_are_written_first() -> Result<()> {
    let line = Line {
        note: "fragile".to_string(),
        sku: "A1".to_string(),
        qty: 2,
        unit: "kg".to_string(),
    };
    let xml = compact().serialize_to_string(&line)?;
    assert_eq!(
        xml,
        r#"<Line sku="A1" unit="kg"><note>fragile</note><qty>2</qty></Line>"#
    );
    assert_eq!(compact().deserialize_str::<Line>(&xml)?, line);
    Ok(())
}

#[test]
fn test_null_and_empty_members_are_skipped() -> Result<()> {
    let profile = Profile {
        nickname: None,
        tags: Vec::new(),
        level: None,
        email: "ann@example.org".to_string(),
    };
    let xml = compact().serialize_to_string(&profile)?;
    assert_eq!(xml, "<Profile><email>ann@example.org</email></Profile>");
    assert_eq!(compact().deserialize_str::<Profile>(&xml)?, profile);

    let profile = Profile {
        nickname: Some("a".to_string()),
        level: Some(3),
        ..profile
    };
    let xml = compact().serialize_to_string(&profile)?;
    assert_eq!(
        xml,
        r#"<Profile level="3"><nickname>a</nickname><email>ann@example.org</email></Profile>"#
    );
    assert_eq!(compact().deserialize_str::<Profile>(&xml)?, profile);
    Ok(())
}

#[test]
fn test_declared_constructor_wins_over_memberwise() -> Result<()> {
    let xml = "<Account><owner>Ann</owner><balance>10.50</balance></Account>";
    let account: Account = from_xml_str(xml)?;
    assert_eq!(account.owner, "Ann");
    assert_eq!(account.balance, dec!(10.50));
    assert_eq!(account.audit, vec!["opened".to_string()]);

    let written = compact().serialize_to_string(&account)?;
    assert_eq!(written, xml);
    Ok(())
}

#[test]
fn test_setters_run_after_constructor() -> Result<()> {
    let settings: Settings = from_xml_str("<Settings><name>db</name><retries>3</retries></Settings>")?;
    assert_eq!(settings.name, "DB");
    assert_eq!(settings.retries, 3);
    Ok(())
}

#[test]
fn test_factory_fallback() -> Result<()> {
    let celsius: Celsius = from_xml_str("<Celsius><kelvin>300</kelvin></Celsius>")?;
    assert_eq!(celsius.degrees, 300.0 - 273.15);

    let celsius: Celsius = from_xml_str("<Celsius><degrees>21.5</degrees></Celsius>")?;
    assert_eq!(celsius.degrees, 21.5);
    Ok(())
}

#[test]
fn test_no_matching_constructor() {
    let err = from_xml_str::<Person>(r#"<Person id="1"><Nick>x</Nick></Person>"#).unwrap_err();
    match err {
        XmlGraphError::Reconstruction { captured, .. } => {
            assert_eq!(captured, vec!["id".to_string(), "Nick".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_conversion_error_names_member_and_type() {
    let err = from_xml_str::<Person>(r#"<Person id="seven"><Name>x</Name></Person>"#).unwrap_err();
    match err {
        XmlGraphError::Conversion { name, source } => {
            assert_eq!(name, "id");
            assert_eq!(source.target, "u32");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_unit_enum_and_rename_all() -> Result<()> {
    assert_eq!(
        compact().serialize_to_string(&Status::OnHold)?,
        "<Status>on-hold</Status>"
    );
    assert_eq!(from_xml_str::<Status>("<Status>gone</Status>")?, Status::Closed);

    let ticket = Ticket {
        status: Status::Active,
        first_reply: "hi".to_string(),
    };
    let xml = compact().serialize_to_string(&ticket)?;
    assert_eq!(
        xml,
        r#"<Ticket status="active"><firstReply>hi</firstReply></Ticket>"#
    );
    assert_eq!(compact().deserialize_str::<Ticket>(&xml)?, ticket);

    let err = from_xml_str::<Status>("<Status>paused</Status>").unwrap_err();
    assert!(err.is_unsupported());
    Ok(())
}

#[test]
fn test_namespaces() -> Result<()> {
    let order = Order {
        id: 1,
        customer: "ACME".to_string(),
    };
    let xml = compact().serialize_to_string(&order)?;
    assert_eq!(
        xml,
        r#"<o:order xmlns:o="urn:orders" id="1"><o:customer>ACME</o:customer></o:order>"#
    );
    assert_eq!(compact().deserialize_str::<Order>(&xml)?, order);
    Ok(())
}

#[test]
fn test_text_member() -> Result<()> {
    let money = Money {
        currency: "EUR".to_string(),
        amount: dec!(9.99),
    };
    let xml = compact().serialize_to_string(&money)?;
    assert_eq!(xml, r#"<Money currency="EUR">9.99</Money>"#);
    assert_eq!(compact().deserialize_str::<Money>(&xml)?, money);
    Ok(())
}

#[test]
fn test_text_member_under_another_root_name() -> Result<()> {
    let money = Money {
        currency: "USD".to_string(),
        amount: dec!(12.50),
    };
    let xml = compact().serialize_to_string_as(&money, "Cash")?;
    assert_eq!(xml, r#"<Cash currency="USD">12.50</Cash>"#);
    assert_eq!(compact().deserialize_str::<Money>(&xml)?, money);
    Ok(())
}

#[test]
fn test_constructor_argument_bound_to_text() -> Result<()> {
    let price = Price::new(dec!(3), "CHF".to_string());
    let xml = compact().serialize_to_string(&price)?;
    assert_eq!(xml, r#"<Price currency="CHF">3</Price>"#);
    assert_eq!(compact().deserialize_str::<Price>(&xml)?, price);
    Ok(())
}

#[test]
fn test_split_cdata_reads_back_whole() -> Result<()> {
    let note = Note {
        id: 1,
        body: "a]]>b".to_string(),
    };
    let xml = compact().serialize_to_string(&note)?;
    assert_eq!(
        xml,
        r#"<Note id="1"><body><![CDATA[a]]]]><![CDATA[>b]]></body></Note>"#
    );
    assert_eq!(compact().deserialize_str::<Note>(&xml)?, note);
    Ok(())
}

#[test]
fn test_names_with_invalid_characters_read_back() -> Result<()> {
    let badge = Badge {
        id: 3,
        label: "gold".to_string(),
    };
    let xml = compact().serialize_to_string(&badge)?;
    assert_eq!(xml, r#"<Badge badgeid="3"><st-label>gold</st-label></Badge>"#);
    assert_eq!(compact().deserialize_str::<Badge>(&xml)?, badge);
    Ok(())
}

#[test]
fn test_collection_member_is_unsupported() -> Result<()> {
    let profile = Profile {
        nickname: None,
        tags: vec!["a".to_string(), "b".to_string()],
        level: None,
        email: "ann@example.org".to_string(),
    };
    let xml = compact().serialize_to_string(&profile)?;
    assert_eq!(
        xml,
        "<Profile><tags><Item>a</Item><Item>b</Item></tags><email>ann@example.org</email></Profile>"
    );
    match compact().deserialize_str::<Profile>(&xml).unwrap_err() {
        XmlGraphError::UnsupportedDeserialization { reason, .. } => {
            assert!(reason.contains("<tags>"), "{reason}");
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[test]
fn test_converter_inside_object_graph() -> Result<()> {
    const COMPACT: &str = "%Y%m%dT%H%M%SZ";
    let mut chain = ConverterChain::new();
    chain.push(
        ConverterDescriptor::for_type::<DateTime<Utc>>()
            .writer(|w, value: &DateTime<Utc>, name| {
                w.element(name, &value.format(COMPACT).to_string())
            })
            .reader(|r| {
                let text = read_text(r)?;
                NaiveDateTime::parse_from_str(&text, COMPACT)
                    .map(|dt| dt.and_utc())
                    .map_err(|e| XmlGraphError::Custom(e.to_string()))
            }),
    );
    let graph = compact().with_converters(chain);

    let event = Event {
        title: "Launch".to_string(),
        when: Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap(),
    };
    let xml = graph.serialize_to_string(&event)?;
    assert_eq!(
        xml,
        "<Event><title>Launch</title><when>20240301T102030Z</when></Event>"
    );
    assert_eq!(graph.deserialize_str::<Event>(&xml)?, event);
    Ok(())
}

#[test]
fn test_list_of_objects() -> Result<()> {
    let people = vec![
        Person {
            name: "a".to_string(),
            id: 1,
        },
        Person {
            name: "b".to_string(),
            id: 2,
        },
    ];
    let xml = compact().serialize_to_string(&people)?;
    assert_eq!(
        xml,
        r#"<Vec><Item id="1"><Name>a</Name></Item><Item id="2"><Name>b</Name></Item></Vec>"#
    );
    Ok(())
}

#[test]
fn test_dictionary_with_complex_values_is_unsupported() -> Result<()> {
    let mut people = BTreeMap::new();
    people.insert(
        "a".to_string(),
        Person {
            name: "x".to_string(),
            id: 7,
        },
    );
    let xml = compact().serialize_to_string(&people)?;
    assert_eq!(
        xml,
        r#"<BTreeMap><Item name="a" id="7"><Name>x</Name></Item></BTreeMap>"#
    );

    let err = compact()
        .deserialize_str::<BTreeMap<String, Person>>(&xml)
        .unwrap_err();
    assert!(err.is_unsupported());
    Ok(())
}

#[test]
fn test_cycle_is_reported_with_path() {
    let link = Rc::new(Link {
        label: "a".to_string(),
        next: OnceCell::new(),
    });
    assert!(link.next.set(Rc::clone(&link)).is_ok());

    let err = to_xml_string(&link).unwrap_err();
    match err {
        XmlGraphError::MalformedDocument { path, source, .. } => {
            assert_eq!(path, "Link.next");
            assert!(matches!(*source, XmlGraphError::Cycle { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_shared_values_are_not_cycles() -> Result<()> {
    let tail = Rc::new(Link {
        label: "tail".to_string(),
        next: OnceCell::new(),
    });
    let head = Link {
        label: "head".to_string(),
        next: OnceCell::from(Rc::clone(&tail)),
    };
    let xml = compact().serialize_to_string(&vec![Rc::clone(&tail), Rc::new(head)])?;
    assert_eq!(
        xml,
        "<Vec><Item><label>tail</label></Item>\
         <Item><label>head</label><next><label>tail</label></next></Item></Vec>"
    );
    Ok(())
}

#[test]
fn test_depth_limit() {
    let graph = XmlGraph::new().with_config(XmlConfig::new().with_max_depth(1));
    let err = graph
        .serialize_to_string(&Outer {
            inner: Inner { value: 1 },
        })
        .unwrap_err();
    match err {
        XmlGraphError::MalformedDocument { source, .. } => {
            assert!(matches!(*source, XmlGraphError::DepthExceeded { limit: 1, .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}
