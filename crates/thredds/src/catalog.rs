//! THREDDS `catalog.xml` model and parser.
//!
//! Only the parts needed to locate datasets are kept: services (with their
//! compound children), leaf datasets (those carrying a `urlPath`) and
//! catalog references.

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::Url;
use tracing::debug;
use wx_common::{WxError, WxResult};

/// A data access service (`OPENDAP`, `HTTPServer`, ...), possibly compound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    pub service_type: String,
    pub base: String,
    pub services: Vec<Service>,
}

impl Service {
    pub fn is_compound(&self) -> bool {
        self.service_type.eq_ignore_ascii_case("compound")
    }

    /// The concrete services this one stands for.
    pub fn leaves(&self) -> Vec<&Service> {
        if self.is_compound() {
            self.services.iter().flat_map(|s| s.leaves()).collect()
        } else {
            vec![self]
        }
    }
}

/// A leaf dataset with its resolved access URLs keyed by service type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDataset {
    pub name: String,
    pub id: Option<String>,
    pub url_path: String,
    pub access_urls: BTreeMap<String, String>,
}

impl CatalogDataset {
    pub fn access_url(&self, service_type: &str) -> Option<&str> {
        self.access_urls.get(service_type).map(String::as_str)
    }

    /// OPeNDAP endpoint, the usual way datasets are opened.
    pub fn opendap_url(&self) -> WxResult<&str> {
        self.access_url("OPENDAP").ok_or_else(|| {
            WxError::DatasetAccess(format!("dataset '{}' has no OPENDAP access", self.name))
        })
    }
}

/// Reference to a child catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRef {
    pub title: String,
    pub name: Option<String>,
    /// Absolute URL of the referenced catalog.
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub url: String,
    pub name: Option<String>,
    pub services: Vec<Service>,
    /// Leaf datasets keyed (and therefore ordered) by name.
    pub datasets: BTreeMap<String, CatalogDataset>,
    /// Catalog references keyed by title.
    pub catalog_refs: BTreeMap<String, CatalogRef>,
}

#[derive(Debug, Default)]
struct PendingDataset {
    name: String,
    id: Option<String>,
    url_path: Option<String>,
    service: Option<String>,
}

impl Catalog {
    /// An empty catalog located at `url`.
    pub fn empty(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            services: Vec::new(),
            datasets: BTreeMap::new(),
            catalog_refs: BTreeMap::new(),
        }
    }

    /// Parse catalog XML fetched from `url`; relative links resolve against it.
    pub fn parse(url: &str, xml: &str) -> WxResult<Self> {
        let base = Url::parse(url)
            .map_err(|e| WxError::CatalogInit(format!("invalid catalog url '{}': {}", url, e)))?;

        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut catalog = Catalog::empty(url);
        let mut service_stack: Vec<Service> = Vec::new();
        let mut dataset_stack: Vec<PendingDataset> = Vec::new();
        let mut leaves: Vec<(PendingDataset, Option<String>)> = Vec::new();
        let mut in_service_name = false;

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"catalog" => catalog.name = attributes(&e)?.remove("name"),
                    b"service" => service_stack.push(service_from(&e)?),
                    b"dataset" => dataset_stack.push(dataset_from(&e)?),
                    b"serviceName" => in_service_name = true,
                    b"catalogRef" => add_catalog_ref(&mut catalog, &base, &e)?,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"service" => {
                        let service = service_from(&e)?;
                        push_service(&mut catalog, &mut service_stack, service);
                    }
                    b"dataset" => {
                        let pending = dataset_from(&e)?;
                        let inherited = inherited_service(&dataset_stack);
                        leaves.push((pending, inherited));
                    }
                    b"catalogRef" => add_catalog_ref(&mut catalog, &base, &e)?,
                    _ => {}
                },
                Ok(Event::Text(t)) if in_service_name => {
                    let text = t
                        .unescape()
                        .map_err(|e| WxError::CatalogInit(format!("bad serviceName text: {}", e)))?
                        .trim()
                        .to_string();
                    if let Some(current) = dataset_stack.last_mut() {
                        current.service = Some(text);
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"service" => {
                        if let Some(service) = service_stack.pop() {
                            push_service(&mut catalog, &mut service_stack, service);
                        }
                    }
                    b"dataset" => {
                        if let Some(pending) = dataset_stack.pop() {
                            let inherited = inherited_service(&dataset_stack);
                            leaves.push((pending, inherited));
                        }
                    }
                    b"serviceName" => in_service_name = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(WxError::CatalogInit(format!(
                        "XML parsing error at position {}: {:?}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        for (pending, inherited) in leaves {
            let Some(url_path) = pending.url_path else {
                continue;
            };
            let service_name = pending.service.or(inherited);
            let access_urls = catalog.access_urls(&base, service_name.as_deref(), &url_path);
            catalog.datasets.insert(
                pending.name.clone(),
                CatalogDataset {
                    name: pending.name,
                    id: pending.id,
                    url_path,
                    access_urls,
                },
            );
        }

        debug!(
            url = %catalog.url,
            datasets = catalog.datasets.len(),
            catalog_refs = catalog.catalog_refs.len(),
            "Parsed catalog"
        );
        Ok(catalog)
    }

    pub fn find_service(&self, name: &str) -> Option<&Service> {
        fn walk<'a>(services: &'a [Service], name: &str) -> Option<&'a Service> {
            services.iter().find_map(|s| {
                if s.name == name {
                    Some(s)
                } else {
                    walk(&s.services, name)
                }
            })
        }
        walk(&self.services, name)
    }

    /// Dataset names in ascending order.
    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    fn access_urls(&self, base: &Url, service_name: Option<&str>, url_path: &str) -> BTreeMap<String, String> {
        let service = service_name
            .and_then(|name| self.find_service(name))
            .or_else(|| self.services.first());

        let mut urls = BTreeMap::new();
        if let Some(service) = service {
            for leaf in service.leaves() {
                if let Ok(url) = base.join(&format!("{}{}", leaf.base, url_path)) {
                    urls.insert(leaf.service_type.clone(), url.to_string());
                }
            }
        }
        urls
    }
}

fn attributes(e: &BytesStart) -> WxResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| WxError::CatalogInit(format!("bad attribute: {}", err)))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| WxError::CatalogInit(format!("bad attribute value: {}", err)))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn service_from(e: &BytesStart) -> WxResult<Service> {
    let mut attrs = attributes(e)?;
    Ok(Service {
        name: attrs.remove("name").unwrap_or_default(),
        service_type: attrs.remove("serviceType").unwrap_or_default(),
        base: attrs.remove("base").unwrap_or_default(),
        services: Vec::new(),
    })
}

fn push_service(catalog: &mut Catalog, stack: &mut [Service], service: Service) {
    match stack.last_mut() {
        Some(parent) => parent.services.push(service),
        None => catalog.services.push(service),
    }
}

fn dataset_from(e: &BytesStart) -> WxResult<PendingDataset> {
    let mut attrs = attributes(e)?;
    Ok(PendingDataset {
        name: attrs.remove("name").unwrap_or_default(),
        id: attrs.remove("ID"),
        url_path: attrs.remove("urlPath"),
        service: attrs.remove("serviceName"),
    })
}

fn inherited_service(stack: &[PendingDataset]) -> Option<String> {
    stack.iter().rev().find_map(|d| d.service.clone())
}

fn add_catalog_ref(catalog: &mut Catalog, base: &Url, e: &BytesStart) -> WxResult<()> {
    let mut attrs = attributes(e)?;
    let href = attrs
        .remove("href")
        .ok_or_else(|| WxError::CatalogInit("catalogRef without href".to_string()))?;
    let href = base
        .join(&href)
        .map_err(|err| WxError::CatalogInit(format!("bad catalogRef href '{}': {}", href, err)))?
        .to_string();
    let name = attrs.remove("name").filter(|n| !n.is_empty());
    let title = attrs
        .remove("title")
        .or_else(|| name.clone())
        .unwrap_or_else(|| href.clone());
    catalog
        .catalog_refs
        .insert(title.clone(), CatalogRef { title, name, href });
    Ok(())
}
