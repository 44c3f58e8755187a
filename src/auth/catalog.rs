// Copyright 2021 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Abstraction over a service catalog.

use std::fmt;
use std::str::FromStr;

use log::{debug, error};
use reqwest::Url;

use super::protocol;
use crate::{Error, ErrorKind, Result};

/// Type of an endpoint in the service catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndpointType {
    /// Public endpoint (`publicURL`).
    #[default]
    Public,
    /// Internal endpoint (`internalURL`).
    Internal,
    /// Admin endpoint (`adminURL`).
    Admin,
}

/// Filters used to select the management URL from a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFilters {
    /// Service type, e.g. `volumev3`.
    pub service_type: String,
    /// Service name (if several services share a type).
    pub service_name: Option<String>,
    /// Endpoint type.
    pub endpoint_type: EndpointType,
    /// Region name.
    pub region: Option<String>,
}

/// Abstraction over a service catalog.
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    inner: Vec<protocol::CatalogRecord>,
}

impl EndpointType {
    /// Key of this endpoint type in the catalog.
    pub fn key(self) -> &'static str {
        match self {
            EndpointType::Public => "publicURL",
            EndpointType::Internal => "internalURL",
            EndpointType::Admin => "adminURL",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EndpointType {
    type Err = Error;

    fn from_str(s: &str) -> Result<EndpointType> {
        match s {
            "publicURL" | "public" => Ok(EndpointType::Public),
            "internalURL" | "internal" => Ok(EndpointType::Internal),
            "adminURL" | "admin" => Ok(EndpointType::Admin),
            other => Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "Invalid endpoint type {}, expected one of publicURL, internalURL, adminURL",
                    other
                ),
            )),
        }
    }
}

impl EndpointFilters {
    /// Filters for a service type with default endpoint type.
    pub fn new<S: Into<String>>(service_type: S) -> EndpointFilters {
        EndpointFilters {
            service_type: service_type.into(),
            service_name: None,
            endpoint_type: EndpointType::default(),
            region: None,
        }
    }

    /// Add a region.
    pub fn with_region<S: Into<String>>(mut self, region: S) -> EndpointFilters {
        self.region = Some(region.into());
        self
    }

    /// Add a service name.
    pub fn with_service_name<S: Into<String>>(mut self, name: S) -> EndpointFilters {
        self.service_name = Some(name.into());
        self
    }

    /// Change the endpoint type.
    pub fn with_endpoint_type(mut self, endpoint_type: EndpointType) -> EndpointFilters {
        self.endpoint_type = endpoint_type;
        self
    }
}

impl Default for EndpointFilters {
    fn default() -> EndpointFilters {
        EndpointFilters::new("volumev3")
    }
}

impl ServiceCatalog {
    pub(crate) fn new(catalog: Vec<protocol::CatalogRecord>) -> ServiceCatalog {
        ServiceCatalog { inner: catalog }
    }

    /// Find an endpoint in the catalog.
    ///
    /// Fails with `EndpointNotFound` when nothing matches and with
    /// `AmbiguousEndpoints` when more than one endpoint matches.
    pub fn find_endpoint(&self, filters: &EndpointFilters) -> Result<Url> {
        let candidates: Vec<&str> = self
            .inner
            .iter()
            .filter(|svc| svc.service_type == filters.service_type)
            .filter(|svc| match filters.service_name {
                Some(ref name) => svc.name.as_ref() == Some(name),
                None => true,
            })
            .flat_map(|svc| svc.endpoints.iter())
            .filter(|endp| match filters.region {
                Some(ref region) => endp.region.as_ref() == Some(region),
                None => true,
            })
            .filter_map(|endp| endp.url_for(filters.endpoint_type))
            .collect();

        match candidates.len() {
            0 => Err(Error::new_endpoint_not_found(&filters.service_type)),
            1 => {
                let url = candidates[0].trim_end_matches('/');
                debug!("Received {} for {}", url, filters.service_type);
                Url::parse(url).map_err(|e| {
                    error!(
                        "Invalid URL {} received from service catalog for service \
                         '{}', filters {:?}: {}",
                        url, filters.service_type, filters, e
                    );
                    Error::new(
                        ErrorKind::InvalidResponse,
                        format!("Invalid URL {} for {} - {}", url, filters.service_type, e),
                    )
                })
            }
            _ => Err(Error::new(
                ErrorKind::AmbiguousEndpoints,
                format!(
                    "Found more than one valid endpoint for service {}, use a more \
                     restrictive filter: {}",
                    filters.service_type,
                    candidates.join(", ")
                ),
            )),
        }
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::Url;

    use super::super::protocol::{CatalogRecord, Endpoint};
    use super::{EndpointFilters, EndpointType, ServiceCatalog};
    use crate::{Error, ErrorKind};

    fn endpoint(region: &str, public: &str, internal: Option<&str>) -> Endpoint {
        Endpoint {
            region: Some(String::from(region)),
            public_url: Some(String::from(public)),
            internal_url: internal.map(String::from),
            admin_url: None,
        }
    }

    fn demo_service1() -> CatalogRecord {
        CatalogRecord {
            service_type: String::from("volumev2"),
            name: Some(String::from("cinderv2")),
            endpoints: vec![
                endpoint(
                    "RegionOne",
                    "https://host.one/volume/v2/p1",
                    Some("http://192.168.22.1/volume/v2/p1"),
                ),
                endpoint("RegionTwo", "https://host.two:8776/v2/p1/", None),
            ],
        }
    }

    fn demo_service2() -> CatalogRecord {
        CatalogRecord {
            service_type: String::from("volumev3"),
            name: Some(String::from("cinderv3")),
            endpoints: vec![endpoint("RegionOne", "https://host.one/volume/v3/p1", None)],
        }
    }

    pub fn demo_catalog() -> ServiceCatalog {
        ServiceCatalog::new(vec![demo_service1(), demo_service2()])
    }

    fn find_endpoint(
        cat: &ServiceCatalog,
        service_type: &str,
        endpoint_type: EndpointType,
        region: Option<&str>,
    ) -> Result<Url, Error> {
        let mut filters = EndpointFilters::new(service_type).with_endpoint_type(endpoint_type);
        filters.region = region.map(String::from);
        cat.find_endpoint(&filters)
    }

    #[test]
    fn test_find_endpoint() {
        let cat = demo_catalog();

        let e1 = find_endpoint(&cat, "volumev3", EndpointType::Public, None).unwrap();
        assert_eq!(e1.as_str(), "https://host.one/volume/v3/p1");

        let e2 = find_endpoint(&cat, "volumev2", EndpointType::Internal, None).unwrap();
        assert_eq!(e2.as_str(), "http://192.168.22.1/volume/v2/p1");
    }

    #[test]
    fn test_find_endpoint_with_region() {
        let cat = demo_catalog();

        let e1 = find_endpoint(&cat, "volumev2", EndpointType::Public, Some("RegionTwo")).unwrap();
        assert_eq!(e1.as_str(), "https://host.two:8776/v2/p1");

        let e2 = find_endpoint(&cat, "volumev2", EndpointType::Public, Some("RegionOne")).unwrap();
        assert_eq!(e2.as_str(), "https://host.one/volume/v2/p1");
    }

    #[test]
    fn test_find_endpoint_ambiguous() {
        let cat = demo_catalog();
        let err = find_endpoint(&cat, "volumev2", EndpointType::Public, None)
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::AmbiguousEndpoints);
    }

    #[test]
    fn test_find_endpoint_service_name() {
        let cat = demo_catalog();
        let filters = EndpointFilters::new("volumev2")
            .with_service_name("cinderv2")
            .with_region("RegionTwo");
        let e1 = cat.find_endpoint(&filters).unwrap();
        assert_eq!(e1.as_str(), "https://host.two:8776/v2/p1");

        let filters = EndpointFilters::new("volumev2").with_service_name("other");
        assert_not_found(cat.find_endpoint(&filters));
    }

    fn assert_not_found(result: Result<Url, Error>) {
        let err = result.err().unwrap();
        if err.kind() != ErrorKind::EndpointNotFound {
            panic!("Unexpected error {}", err);
        }
    }

    #[test]
    fn test_find_endpoint_not_found() {
        let cat = demo_catalog();

        assert_not_found(find_endpoint(&cat, "foobar", EndpointType::Public, None));
        assert_not_found(find_endpoint(&cat, "volumev3", EndpointType::Public, Some("RegionFoo")));
        assert_not_found(find_endpoint(&cat, "volumev3", EndpointType::Internal, None));
        assert_not_found(find_endpoint(&cat, "volumev2", EndpointType::Internal, Some("RegionTwo")));
        assert_not_found(find_endpoint(&cat, "volumev2", EndpointType::Admin, None));
    }

    #[test]
    fn test_endpoint_type_parse() {
        assert_eq!("publicURL".parse::<EndpointType>().unwrap(), EndpointType::Public);
        assert_eq!("internal".parse::<EndpointType>().unwrap(), EndpointType::Internal);
        assert_eq!("adminURL".parse::<EndpointType>().unwrap(), EndpointType::Admin);
        assert!("private".parse::<EndpointType>().is_err());
        assert_eq!(EndpointType::Internal.to_string(), "internalURL");
    }
}
