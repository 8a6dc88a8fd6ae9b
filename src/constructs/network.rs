// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Constructor
//!
//! Virtual network with two public and two private subnets (one of each per
//! availability zone), routing, a NAT gateway for private egress, network ACLs
//! and the security groups the container service and load balancer attach to.
//!
//! Subnets are consecutive `/24` blocks carved from the network CIDR:
//! public subnets take blocks 0 and 1, private subnets blocks 2 and 3.

use serde::Serialize;
use serde_json::{json, Value};

use super::{logical, names, Construction, Constructor, Stage, Upstream};
use crate::assembler::GraphError;
use crate::config::{AppConfig, SUBNET_PREFIX};
use crate::domain::{Ipv4Cidr, PortRange, ResourceKind};
use crate::resource::ResourceHandle;

/// Traffic protocol of an ACL entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    All,
}

/// Direction of an ACL entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One network ACL rule (all rules allow)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AclEntry {
    pub rule_number: u16,
    pub direction: Direction,
    pub protocol: Protocol,
    pub cidr_block: Ipv4Cidr,
    pub port_range: PortRange,
}

impl AclEntry {
    const fn inbound_tcp(rule_number: u16, ports: PortRange) -> Self {
        Self {
            rule_number,
            direction: Direction::Inbound,
            protocol: Protocol::Tcp,
            cidr_block: Ipv4Cidr::ANY,
            port_range: ports,
        }
    }

    const fn outbound_all(rule_number: u16) -> Self {
        Self {
            rule_number,
            direction: Direction::Outbound,
            protocol: Protocol::All,
            cidr_block: Ipv4Cidr::ANY,
            port_range: PortRange::ALL,
        }
    }
}

/// Rules of the ACL guarding the public subnets
pub fn public_acl_entries() -> Vec<AclEntry> {
    vec![
        AclEntry::inbound_tcp(99, PortRange::single(80)),
        AclEntry::inbound_tcp(100, PortRange::single(443)),
        AclEntry::inbound_tcp(110, PortRange::EPHEMERAL),
        AclEntry::outbound_all(101),
    ]
}

/// Rules of the ACL guarding the private subnets
pub fn private_acl_entries() -> Vec<AclEntry> {
    vec![
        AclEntry::inbound_tcp(102, PortRange::single(443)),
        AclEntry::inbound_tcp(103, PortRange::EPHEMERAL),
        AclEntry::inbound_tcp(106, PortRange::single(80)),
        AclEntry::outbound_all(110),
    ]
}

/// Network stage
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkConstructor;

impl NetworkConstructor {
    fn subnet(
        config: &AppConfig,
        vpc: &ResourceHandle,
        name: String,
        block: u32,
        zone: &str,
        public: bool,
    ) -> Result<ResourceHandle, GraphError> {
        let cidr = config.vpc_cidr.subnet(SUBNET_PREFIX, block)?;
        let handle = ResourceHandle::builder(logical(name)?, ResourceKind::Subnet)
            .depends_on(vpc)
            .properties(json!({
                "VpcId": vpc.reference("id")?,
                "CidrBlock": cidr,
                "AvailabilityZone": zone,
                "MapPublicIpOnLaunch": public,
            }))
            .deferred("id")
            .output("cidr", cidr.as_cidr())
            .output("availability_zone", zone)
            .build()?;
        Ok(handle)
    }

    fn route_table(
        vpc: &ResourceHandle,
        name: String,
        subnet: &ResourceHandle,
        target: &ResourceHandle,
        target_key: &str,
    ) -> Result<ResourceHandle, GraphError> {
        let handle = ResourceHandle::builder(logical(name)?, ResourceKind::RouteTable)
            .depends_on(vpc)
            .depends_on(subnet)
            .depends_on(target)
            .properties(json!({
                "VpcId": vpc.reference("id")?,
                "SubnetAssociation": subnet.reference("id")?,
                "Routes": [{
                    "DestinationCidrBlock": Ipv4Cidr::ANY,
                    target_key: target.reference("id")?,
                }],
            }))
            .deferred("id")
            .build()?;
        Ok(handle)
    }

    fn network_acl(
        vpc: &ResourceHandle,
        name: &str,
        subnets: &[&ResourceHandle],
        entries: Vec<AclEntry>,
    ) -> Result<ResourceHandle, GraphError> {
        let subnet_ids = subnets
            .iter()
            .map(|s| s.reference("id"))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = ResourceHandle::builder(logical(name)?, ResourceKind::NetworkAcl)
            .depends_on(vpc)
            .properties(json!({
                "VpcId": vpc.reference("id")?,
                "Entries": entries,
                "SubnetAssociations": subnet_ids,
            }))
            .deferred("id");
        for subnet in subnets {
            builder = builder.depends_on(subnet);
        }
        Ok(builder.build()?)
    }

    fn security_group(
        vpc: &ResourceHandle,
        name: &str,
        description: &str,
        ports: &[u16],
    ) -> Result<ResourceHandle, GraphError> {
        let ingress: Vec<Value> = ports
            .iter()
            .map(|port| {
                json!({
                    "Protocol": Protocol::Tcp,
                    "CidrBlock": Ipv4Cidr::ANY,
                    "PortRange": PortRange::single(*port),
                })
            })
            .collect();

        let handle = ResourceHandle::builder(logical(name)?, ResourceKind::SecurityGroup)
            .depends_on(vpc)
            .properties(json!({
                "VpcId": vpc.reference("id")?,
                "Description": description,
                "Ingress": ingress,
                "AllowAllOutbound": true,
            }))
            .deferred("id")
            .build()?;
        Ok(handle)
    }
}

impl Constructor for NetworkConstructor {
    fn name(&self) -> &str {
        "network"
    }

    fn stage(&self) -> Stage {
        Stage::Network
    }

    fn construct(&self, config: &AppConfig, _upstream: &Upstream<'_>) -> Result<Construction, GraphError> {
        let mut out = Construction::builder(self.name());

        let vpc = ResourceHandle::builder(logical(names::VPC)?, ResourceKind::Vpc)
            .properties(json!({
                "Name": config.physical_name("vpc"),
                "CidrBlock": config.vpc_cidr,
                "EnableDnsHostnames": true,
                "EnableDnsSupport": true,
            }))
            .deferred("id")
            .output("cidr", config.vpc_cidr.as_cidr())
            .build()?;

        let igw = ResourceHandle::builder(logical(names::INTERNET_GATEWAY)?, ResourceKind::InternetGateway)
            .depends_on(&vpc)
            .property("AttachedVpcId", vpc.reference("id")?)
            .deferred("id")
            .build()?;

        let zones = &config.availability_zones;
        let mut public = Vec::with_capacity(zones.len());
        let mut private = Vec::with_capacity(zones.len());
        for (i, zone) in zones.iter().enumerate() {
            let block = i as u32;
            public.push(Self::subnet(config, &vpc, names::public_subnet(i), block, zone, true)?);
            private.push(Self::subnet(
                config,
                &vpc,
                names::private_subnet(i),
                block + zones.len() as u32,
                zone,
                false,
            )?);
        }

        let eip = ResourceHandle::builder(logical(names::NAT_ADDRESS)?, ResourceKind::ElasticIp)
            .depends_on(&igw)
            .property("Domain", "vpc")
            .deferred("allocation_id")
            .deferred("public_ip")
            .build()?;

        let nat = ResourceHandle::builder(logical(names::NAT_GATEWAY)?, ResourceKind::NatGateway)
            .depends_on(&eip)
            .depends_on(&public[0])
            .properties(json!({
                "AllocationId": eip.reference("allocation_id")?,
                "SubnetId": public[0].reference("id")?,
            }))
            .deferred("id")
            .build()?;

        let mut route_tables = Vec::new();
        for (i, subnet) in public.iter().enumerate() {
            route_tables.push(Self::route_table(&vpc, names::public_route_table(i), subnet, &igw, "GatewayId")?);
        }
        for (i, subnet) in private.iter().enumerate() {
            route_tables.push(Self::route_table(&vpc, names::private_route_table(i), subnet, &nat, "NatGatewayId")?);
        }

        let public_acl = Self::network_acl(
            &vpc,
            names::PUBLIC_ACL,
            &public.iter().collect::<Vec<_>>(),
            public_acl_entries(),
        )?;
        let private_acl = Self::network_acl(
            &vpc,
            names::PRIVATE_ACL,
            &private.iter().collect::<Vec<_>>(),
            private_acl_entries(),
        )?;

        let service_sg = Self::security_group(
            &vpc,
            names::SERVICE_SECURITY_GROUP,
            "Allow traffic to the container service",
            &[80],
        )?;
        let lb_sg = Self::security_group(
            &vpc,
            names::LOAD_BALANCER_SECURITY_GROUP,
            "Allow traffic to the load balancer",
            &[80, 443],
        )?;

        out.add_primary(vpc);
        out.add(igw);
        public.into_iter().for_each(|s| out.add(s));
        private.into_iter().for_each(|s| out.add(s));
        out.add(eip);
        out.add(nat);
        route_tables.into_iter().for_each(|r| out.add(r));
        out.add(public_acl);
        out.add(private_acl);
        out.add(service_sg);
        out.add(lb_sg);

        out.build()
    }
}
