use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use helios_xmlgraph::xml::{from_xml_str, read_text, to_xml_string};
use helios_xmlgraph::{
    ConverterChain, ConverterDescriptor, Named, Result, TypeRef, XmlConfig, XmlGraph,
    XmlGraphError,
};
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const COMPACT: &str = "%Y%m%dT%H%M%SZ";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn compact_dates() -> ConverterChain {
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
    chain
}

#[test]
fn test_simple_roots_round_trip() -> Result<()> {
    init_tracing();

    let xml = to_xml_string(&dec!(12.345))?;
    assert_eq!(xml, format!("{DECLARATION}<Decimal>12.345</Decimal>"));
    assert_eq!(from_xml_str::<rust_decimal::Decimal>(&xml)?, dec!(12.345));

    let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
    let xml = to_xml_string(&id)?;
    assert_eq!(
        xml,
        format!("{DECLARATION}<Uuid>67e55044-10b1-426f-9247-bb680e5fe0c8</Uuid>")
    );
    assert_eq!(from_xml_str::<Uuid>(&xml)?, id);

    let xml = to_xml_string(&true)?;
    assert_eq!(xml, format!("{DECLARATION}<bool>true</bool>"));
    assert!(from_xml_str::<bool>(&xml)?);

    Ok(())
}

#[test]
fn test_markup_text_uses_cdata() -> Result<()> {
    let xml = to_xml_string(&"a < b & c".to_string())?;
    assert_eq!(
        xml,
        format!("{DECLARATION}<String><![CDATA[a < b & c]]></String>")
    );
    assert_eq!(from_xml_str::<String>(&xml)?, "a < b & c");

    let xml = to_xml_string(&"   ".to_string())?;
    assert_eq!(xml, format!("{DECLARATION}<String><![CDATA[   ]]></String>"));
    assert_eq!(from_xml_str::<String>(&xml)?, "   ");

    Ok(())
}

#[test]
fn test_list_round_trip() -> Result<()> {
    let xml = to_xml_string(&vec![1, 2, 3])?;
    assert_eq!(
        xml,
        format!("{DECLARATION}<Vec><Item>1</Item><Item>2</Item><Item>3</Item></Vec>")
    );
    assert_eq!(from_xml_str::<Vec<i32>>(&xml)?, vec![1, 2, 3]);
    Ok(())
}

#[test]
fn test_list_with_null_items() -> Result<()> {
    let values = vec![Some(1u8), None, Some(3)];
    let xml = to_xml_string(&values)?;
    assert_eq!(
        xml,
        format!("{DECLARATION}<Vec><Item>1</Item><Item/><Item>3</Item></Vec>")
    );
    assert_eq!(from_xml_str::<Vec<Option<u8>>>(&xml)?, values);
    Ok(())
}

#[test]
fn test_list_item_conversion_error_names_item() {
    let err = from_xml_str::<Vec<u8>>("<Vec><Item>1</Item><Item>300</Item></Vec>").unwrap_err();
    match err {
        XmlGraphError::Conversion { name, source } => {
            assert_eq!(name, "Item[1]");
            assert_eq!(source.target, "u8");
            assert_eq!(source.value, "300");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_dictionary_round_trip() -> Result<()> {
    let mut scores = BTreeMap::new();
    scores.insert("ann".to_string(), 3i64);
    scores.insert("bob".to_string(), -1i64);

    let xml = to_xml_string(&scores)?;
    assert_eq!(
        xml,
        format!(
            r#"{DECLARATION}<BTreeMap><Item name="ann">3</Item><Item name="bob">-1</Item></BTreeMap>"#
        )
    );
    assert_eq!(from_xml_str::<BTreeMap<String, i64>>(&xml)?, scores);

    let hashed: HashMap<String, i64> = from_xml_str(&xml)?;
    assert_eq!(hashed.len(), 2);
    assert_eq!(hashed["bob"], -1);
    Ok(())
}

#[test]
fn test_type_root_is_written_as_text() -> Result<()> {
    assert_eq!(to_xml_string(&TypeRef::of::<u8>())?, "u8");
    assert!(
        from_xml_str::<TypeRef>("u8")
            .unwrap_err()
            .is_unsupported()
    );
    Ok(())
}

#[test]
fn test_named_values_and_root_override() -> Result<()> {
    let graph = XmlGraph::new().with_config(XmlConfig::new().with_xml_declaration(false));

    let total = Named::new("total", 42u32);
    assert_eq!(graph.serialize_to_string(&total)?, "<total>42</total>");
    assert_eq!(
        graph.serialize_to_string_as(&total, "sum")?,
        "<sum>42</sum>"
    );
    assert_eq!(graph.deserialize_str::<u32>("<sum>42</sum>")?, 42);
    Ok(())
}

#[test]
fn test_converter_takes_over_root() -> Result<()> {
    let graph = XmlGraph::new().with_converters(compact_dates());
    let when = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap();

    let xml = graph.serialize_to_string(&when)?;
    assert_eq!(xml, format!("{DECLARATION}<DateTime>20240301T102030Z</DateTime>"));
    assert_eq!(graph.deserialize_str::<DateTime<Utc>>(&xml)?, when);
    Ok(())
}

#[test]
fn test_converter_applies_to_list_items() -> Result<()> {
    let graph = XmlGraph::new()
        .with_config(XmlConfig::new().with_xml_declaration(false))
        .with_converters(compact_dates());
    let when = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap();

    let xml = graph.serialize_to_string(&vec![when])?;
    assert_eq!(xml, "<Vec><Item>20240301T102030Z</Item></Vec>");
    Ok(())
}

#[test]
fn test_default_date_time_form() -> Result<()> {
    let when = Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap();
    let xml = to_xml_string(&when)?;
    assert_eq!(
        xml,
        format!("{DECLARATION}<DateTime>2024-03-01T10:20:30Z</DateTime>")
    );
    assert_eq!(from_xml_str::<DateTime<Utc>>(&xml)?, when);
    Ok(())
}

#[test]
fn test_writer_errors_are_malformed_document() {
    let mut chain = ConverterChain::new();
    chain.push(
        ConverterDescriptor::for_type::<u16>()
            .writer(|_, _, _| Err(XmlGraphError::Custom("port out of range".to_string()))),
    );
    let graph = XmlGraph::new().with_converters(chain);

    let err = graph.serialize_to_string(&vec![80u16]).unwrap_err();
    match err {
        XmlGraphError::MalformedDocument {
            path,
            context,
            source,
            ..
        } => {
            assert_eq!(path, "Vec.Item[0]");
            assert_eq!(context, "root override: none");
            assert_eq!(source.to_string(), "port out of range");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_indented_output() -> Result<()> {
    let graph = XmlGraph::new().with_config(
        XmlConfig::from_json_str(r#"{"xml_declaration": false, "indent": 2}"#)?,
    );
    let xml = graph.serialize_to_string(&vec!["a".to_string(), "b".to_string()])?;
    assert_eq!(xml, "<Vec>\n  <Item>a</Item>\n  <Item>b</Item>\n</Vec>");

    let values: Vec<String> = graph.deserialize_str(&xml)?;
    assert_eq!(values, vec!["a", "b"]);
    Ok(())
}

#[test]
fn test_invalid_config_from_json() {
    let err = XmlConfig::from_json_str(r#"{"max_depth": 0}"#).unwrap_err();
    assert!(matches!(err, XmlGraphError::Config(_)));
}
