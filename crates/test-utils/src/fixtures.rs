//! Catalog documents and dataset names seen on real servers.

/// GOES legacy water vapor scans of 2016-01-28.
pub const GOES_LEGACY_WV_KEYS: [&str; 4] = [
    "EAST-CONUS_4km_WV_20160128_0530.gini",
    "EAST-CONUS_4km_WV_20160128_0630.gini",
    "EAST-CONUS_4km_WV_20160128_0715.gini",
    "EAST-CONUS_4km_WV_20160128_0745.gini",
];

/// GOES-16 CONUS channel 1 scans of 2017-06-18.
pub const GOES16_JUNE18_KEYS: [&str; 3] = [
    "GOES16_20170618_003719_0.64_500m_33.3N_91.4W.nc4",
    "GOES16_20170618_004719_0.64_500m_33.3N_91.4W.nc4",
    "GOES16_20170618_011719_0.64_500m_33.3N_91.4W.nc4",
];

/// KMUX Level II scans, deliberately out of order.
pub const KMUX_KEYS: [&str; 5] = [
    "Level2_KMUX_20170715_2333.ar2v",
    "Level2_KMUX_20170715_2349.ar2v",
    "Level2_KMUX_20170715_2336.ar2v",
    "Level2_KMUX_20170716_0003.ar2v",
    "Level2_KMUX_20170716_0013.ar2v",
];

/// Catalog listing `names` behind a compound OPENDAP/HTTPServer/CdmRemote
/// service. Each dataset's url path is `<path_prefix><name>`.
pub fn dataset_catalog_xml(path_prefix: &str, names: &[&str]) -> String {
    let datasets: String = names
        .iter()
        .map(|name| format!(r#"    <dataset name="{name}" ID="{name}" urlPath="{path_prefix}{name}"/>"#) + "\n")
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0" version="1.0.1">
  <service name="all" serviceType="Compound" base="">
    <service name="OPENDAP" serviceType="OPENDAP" base="/thredds/dodsC/"/>
    <service name="HTTPServer" serviceType="HTTPServer" base="/thredds/fileServer/"/>
    <service name="CdmRemote" serviceType="CdmRemote" base="/thredds/cdmremote/"/>
  </service>
  <dataset name="collection">
    <metadata inherited="true"><serviceName>all</serviceName></metadata>
{datasets}  </dataset>
</catalog>"#
    )
}

/// Catalog whose only content is references titled `titles`, each pointing
/// at `<title>/catalog.xml`.
pub fn catalog_refs_xml(titles: &[&str]) -> String {
    let refs: String = titles
        .iter()
        .map(|t| format!(r#"  <catalogRef xlink:href="{t}/catalog.xml" xlink:title="{t}" name=""/>"#) + "\n")
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<catalog xmlns="http://www.unidata.ucar.edu/namespaces/thredds/InvCatalog/v1.0" xmlns:xlink="http://www.w3.org/1999/xlink">
{refs}</catalog>"#
    )
}

/// Radar server root catalog listing Level II and Level III collections.
pub fn radar_root_catalog_xml() -> String {
    r#"<catalog xmlns:xlink="http://www.w3.org/1999/xlink">
  <catalogRef xlink:href="nexrad/level2/IDD/dataset.xml" xlink:title="NEXRAD Level II Radar from IDD" name=""/>
  <catalogRef xlink:href="nexrad/level3/IDD/dataset.xml" xlink:title="NEXRAD Level III Radar from IDD" name=""/>
</catalog>"#
        .to_string()
}

/// `stations.xml` with entries of `(id, name, lat, lon, elevation)`.
pub fn stations_xml(stations: &[(&str, &str, f64, f64, f64)]) -> String {
    let body: String = stations
        .iter()
        .map(|(id, name, lat, lon, elev)| {
            format!(
                "  <station id=\"{id}\"><name>{name}</name><latitude>{lat}</latitude><longitude>{lon}</longitude><elevation>{elev}</elevation></station>\n"
            )
        })
        .collect();
    format!("<stationsList>\n{body}</stationsList>")
}

/// A small Celsius IR palette in `.pal` format.
pub const IR_PALETTE: &str = "\
; test palette
Unit: C
Color: 50 0 0 0
Color: 0 255 255 255 0 0 0
Color: -40 255 0 0
Color: -80 255 0 255
";
