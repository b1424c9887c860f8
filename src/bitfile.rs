//! `.lvbitx` bitfile parsing: the signature, the device base address, and
//! the register and FIFO descriptors with their cached type trees.
//!
//! Registers and FIFOs whose declared type cannot be built (an unsupported
//! kind, or duplicate cluster member names) are skipped with a logged
//! warning rather than failing the whole bitfile; the remaining entries
//! stay usable.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use roxmltree::{Document, Node};

use crate::{
    errors::BitfileError,
    schema::{self, child_text, element_child},
    types::Type,
};

/// Parsed contents of a `.lvbitx` file.
#[derive(Debug)]
pub struct Bitfile {
    signature: String,
    base_address_on_device: u64,
    registers: IndexMap<String, Register>,
    fifos: IndexMap<String, Fifo>,
}

/// A control or indicator from the front panel of the top-level FPGA VI.
#[derive(Debug)]
pub struct Register {
    name: String,
    offset: u64,
    is_indicator: bool,
    is_internal: bool,
    access_may_timeout: bool,
    ty: Type,
}

/// A DMA channel declared by the bitfile.
#[derive(Debug)]
pub struct Fifo {
    name: String,
    number: u32,
    ty: Type,
}

impl Bitfile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BitfileError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(xml: &str) -> Result<Self, BitfileError> {
        let document = Document::parse(xml)?;
        let root = document.root_element();

        let signature = child_text(root, "SignatureRegister")
            .ok_or(BitfileError::MissingElement("SignatureRegister"))?
            .trim()
            .to_uppercase();

        let nifpga = element_child(root, "Project")
            .and_then(|node| element_child(node, "CompilationResultsTree"))
            .and_then(|node| element_child(node, "CompilationResults"))
            .and_then(|node| element_child(node, "NiFpga"))
            .ok_or(BitfileError::MissingElement("NiFpga"))?;
        let base_address_on_device = required_number(nifpga, "BaseAddressOnDevice")?;

        let register_list = element_child(root, "VI")
            .and_then(|vi| element_child(vi, "RegisterList"))
            .ok_or(BitfileError::MissingElement("RegisterList"))?;
        let mut registers = IndexMap::new();
        for node in register_list.children().filter(Node::is_element) {
            let name = child_text(node, "Name")
                .ok_or(BitfileError::MissingElement("Name"))?
                .to_string();
            match Register::from_node(&name, node) {
                Ok(register) => {
                    if registers.insert(name.clone(), register).is_some() {
                        return Err(BitfileError::DuplicateRegister(name));
                    }
                }
                Err(BitfileError::Type(error)) => {
                    log::warn!("skipping register '{name}': {error}");
                }
                Err(error) => return Err(error),
            }
        }

        let mut fifos = IndexMap::new();
        if let Some(channels) = element_child(nifpga, "DmaChannelAllocationList") {
            for node in channels.children().filter(Node::is_element) {
                let name = node
                    .attribute("name")
                    .ok_or(BitfileError::MissingElement("name"))?
                    .to_string();
                match Fifo::from_node(&name, node) {
                    Ok(fifo) => {
                        fifos.insert(name, fifo);
                    }
                    Err(BitfileError::Type(error)) => {
                        log::warn!("skipping FIFO '{name}': {error}");
                    }
                    Err(error) => return Err(error),
                }
            }
        }

        Ok(Bitfile { signature, base_address_on_device, registers, fifos })
    }

    /// The bitfile's signature, uppercased.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Offset on the device that registers are located at; a register's
    /// absolute address is this base plus its own offset.
    pub fn base_address_on_device(&self) -> u64 {
        self.base_address_on_device
    }

    /// Registers (controls and indicators), indexed by name and in
    /// declaration order.
    pub fn registers(&self) -> &IndexMap<String, Register> {
        &self.registers
    }

    /// DMA FIFOs, indexed by name and in declaration order.
    pub fn fifos(&self) -> &IndexMap<String, Fifo> {
        &self.fifos
    }
}

impl Register {
    fn from_node(name: &str, node: Node) -> Result<Self, BitfileError> {
        let datatype = element_child(node, "Datatype")
            .and_then(|dt| dt.children().find(Node::is_element))
            .ok_or(BitfileError::MissingElement("Datatype"))?;
        Ok(Register {
            name: name.to_string(),
            offset: required_number(node, "Offset")?,
            is_indicator: bool_text(node, "Indicator"),
            is_internal: bool_text(node, "Internal"),
            access_may_timeout: bool_text(node, "AccessMayTimeout"),
            ty: schema::parse_type(datatype)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Offset of this register from the device base address.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_indicator(&self) -> bool {
        self.is_indicator
    }

    pub fn is_internal(&self) -> bool {
        self.is_internal
    }

    /// Whether an access could time out, e.g. a register in an external
    /// clock domain.
    pub fn access_may_timeout(&self) -> bool {
        self.access_may_timeout
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_array(&self) -> bool {
        self.ty.is_array()
    }

    pub fn num_elements(&self) -> usize {
        match &self.ty.kind {
            crate::types::TypeKind::Array { length, .. } => *length,
            _ => 1,
        }
    }
}

impl Fifo {
    fn from_node(name: &str, node: Node) -> Result<Self, BitfileError> {
        let datatype = element_child(node, "DataType")
            .ok_or(BitfileError::MissingElement("DataType"))?;
        // Composite FIFO declarations nest a recursive type inside
        // DataType; scalar ones carry a flat SubType leaf directly.
        let type_node = if element_child(datatype, "SubType").is_some() {
            datatype
        } else {
            datatype
                .children()
                .find(Node::is_element)
                .ok_or(BitfileError::MissingElement("DataType"))?
        };
        Ok(Fifo {
            name: name.to_string(),
            number: required_number(node, "Number")?,
            ty: schema::parse_type(type_node)?,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique identifier of this FIFO within the bitfile.
    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_fxp(&self) -> bool {
        self.ty.is_fxp()
    }

    pub fn is_composite(&self) -> bool {
        self.ty.is_composite()
    }
}

fn bool_text(node: Node, tag: &str) -> bool {
    child_text(node, tag).is_some_and(|text| text.trim().eq_ignore_ascii_case("true"))
}

fn required_number<T: std::str::FromStr>(
    node: Node,
    tag: &'static str,
) -> Result<T, BitfileError> {
    let text = child_text(node, tag).ok_or(BitfileError::MissingElement(tag))?;
    text.trim()
        .parse()
        .map_err(|_| BitfileError::InvalidNumber { element: tag, text: text.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BITFILE_XML: &str = r#"
<Bitfile>
    <SignatureRegister>abcdef0123456789</SignatureRegister>
    <Project>
        <CompilationResultsTree>
            <CompilationResults>
                <NiFpga>
                    <BaseAddressOnDevice>98304</BaseAddressOnDevice>
                    <DmaChannelAllocationList>
                        <Channel name="host_to_target">
                            <Number>0</Number>
                            <DataType>
                                <SubType>U64</SubType>
                            </DataType>
                        </Channel>
                        <Channel name="fxp_stream">
                            <Number>1</Number>
                            <DataType>
                                <SubType>FXP</SubType>
                                <Signed>true</Signed>
                                <WordLength>16</WordLength>
                                <IntegerWordLength>8</IntegerWordLength>
                            </DataType>
                        </Channel>
                        <Channel name="broken">
                            <Number>2</Number>
                            <DataType>
                                <SubType>CFXP</SubType>
                            </DataType>
                        </Channel>
                    </DmaChannelAllocationList>
                </NiFpga>
            </CompilationResults>
        </CompilationResultsTree>
    </Project>
    <VI>
        <RegisterList>
            <Register>
                <Name>Input U64</Name>
                <Indicator>false</Indicator>
                <Datatype>
                    <U64>
                    </U64>
                </Datatype>
                <Offset>98464</Offset>
                <Internal>false</Internal>
                <AccessMayTimeout>false</AccessMayTimeout>
            </Register>
            <Register>
                <Name>Output Array Bool 17</Name>
                <Indicator>true</Indicator>
                <Datatype>
                    <Array>
                        <Name>Output Array Bool 17</Name>
                        <Size>17</Size>
                        <Type>
                            <Boolean>
                            </Boolean>
                        </Type>
                    </Array>
                </Datatype>
                <Offset>98364</Offset>
                <Internal>false</Internal>
                <AccessMayTimeout>true</AccessMayTimeout>
            </Register>
            <Register>
                <Name>Complex Register</Name>
                <Indicator>false</Indicator>
                <Datatype>
                    <CFXP>
                        <Name>Complex Register</Name>
                    </CFXP>
                </Datatype>
                <Offset>98564</Offset>
                <Internal>false</Internal>
                <AccessMayTimeout>false</AccessMayTimeout>
            </Register>
        </RegisterList>
    </VI>
</Bitfile>
"#;

    #[test]
    fn test_parse_bitfile() {
        let bitfile = Bitfile::parse(BITFILE_XML).unwrap();
        assert_eq!(bitfile.signature(), "ABCDEF0123456789");
        assert_eq!(bitfile.base_address_on_device(), 98304);
    }

    #[test]
    fn test_registers_keep_declaration_order_and_attributes() {
        let bitfile = Bitfile::parse(BITFILE_XML).unwrap();
        let names: Vec<_> = bitfile.registers().keys().map(String::as_str).collect();
        // The CFXP register is skipped, not fatal.
        assert_eq!(names, vec!["Input U64", "Output Array Bool 17"]);

        let scalar = &bitfile.registers()["Input U64"];
        assert_eq!(scalar.offset(), 98464);
        assert!(!scalar.is_indicator());
        assert!(!scalar.is_array());
        assert_eq!(scalar.num_elements(), 1);
        assert_eq!(scalar.ty().size_in_bits(), 64);

        let array = &bitfile.registers()["Output Array Bool 17"];
        assert!(array.is_indicator());
        assert!(array.access_may_timeout());
        assert!(array.is_array());
        assert_eq!(array.num_elements(), 17);
        assert_eq!(array.ty().size_in_bits(), 17);
    }

    #[test]
    fn test_fifos_resolve_both_type_shapes() {
        let bitfile = Bitfile::parse(BITFILE_XML).unwrap();
        let names: Vec<_> = bitfile.fifos().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["host_to_target", "fxp_stream"]);

        let scalar = &bitfile.fifos()["host_to_target"];
        assert_eq!(scalar.number(), 0);
        assert!(!scalar.is_fxp());
        assert!(!scalar.is_composite());

        let fxp = &bitfile.fifos()["fxp_stream"];
        assert_eq!(fxp.number(), 1);
        assert!(fxp.is_fxp());
        assert_eq!(fxp.ty().size_in_bits(), 16);
    }

    #[test]
    fn test_duplicate_register_names_fail() {
        let xml = BITFILE_XML.replace("Output Array Bool 17</Name>", "Input U64</Name>");
        assert!(matches!(
            Bitfile::parse(&xml),
            Err(BitfileError::DuplicateRegister(_))
        ));
    }

    #[test]
    fn test_missing_signature_fails() {
        let xml = BITFILE_XML.replace("SignatureRegister", "SomethingElse");
        assert!(matches!(
            Bitfile::parse(&xml),
            Err(BitfileError::MissingElement("SignatureRegister"))
        ));
    }
}
