//! Rendering of scan results for people (`text`) and machines (`json`).

use std::fmt::Display;
use std::io::{self, Write};
use std::str::FromStr;

use owo_colors::{OwoColorize, Style};

use crate::finding::{Finding, Findings};

/// Days-left tier rendered in the most severe colour.
const CRITICAL_DAYS: i64 = 15;

pub trait Writer {
    fn write(&self, findings: &Findings, out: &mut dyn Write) -> io::Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("output option {} not valid", other)),
        }
    }
}

pub fn new_writer(format: OutputFormat, color: bool) -> Box<dyn Writer> {
    match format {
        OutputFormat::Text => Box::new(TextWriter::new(color)),
        OutputFormat::Json => Box::new(JsonWriter),
    }
}

pub struct JsonWriter;

impl Writer for JsonWriter {
    fn write(&self, findings: &Findings, out: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *out, findings)?;
        writeln!(out)
    }
}

pub struct TextWriter {
    color: bool,
}

impl TextWriter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint<T: Display>(&self, value: T, style: Style) -> String {
        if self.color {
            value.style(style).to_string()
        } else {
            value.to_string()
        }
    }

    fn write_finding(&self, namespace: &str, finding: &Finding, out: &mut dyn Write) -> io::Result<()> {
        let cert = &finding.certificate;
        writeln!(
            out,
            "\t{}",
            self.paint(format!("Secret: {}", finding.secret_name), Style::new().cyan())
        )?;
        writeln!(out, "\tSubject: {}", cert.subject)?;
        writeln!(out, "\tDNS Names:")?;
        for dns_name in &cert.dns_names {
            writeln!(out, "\t\t{}", dns_name)?;
        }

        let days = finding.days_until_expiry;
        let severity = if days < CRITICAL_DAYS {
            Style::new().red()
        } else {
            Style::new().yellow()
        };
        writeln!(out, "\tDays Until Expiry: {}", self.paint(days, severity))?;
        if finding.expired {
            writeln!(out, "\t{}", self.paint("EXPIRED", Style::new().red().bold()))?;
        }
        writeln!(out, "\tExpiry Date: {}", cert.not_after.format("%Y-%m-%d %H:%M:%S UTC"))?;

        let status = &finding.cert_manager;
        if status.is_managed() {
            writeln!(
                out,
                "\tManaged By Certificate Resource: {}/{}",
                namespace, status.certificate_name
            )?;

            let warn = Style::new().yellow();
            if !status.certificate_resource_exists {
                writeln!(
                    out,
                    "\t\t{}",
                    self.paint("!!!CERTIFICATE RESOURCE DOES NOT EXIST!!!", Style::new().red())
                )?;
                writeln!(out, "\t\t{}", self.paint("If this secret is in use, any domain it serves will end up with an expired certificate.", warn))?;
                writeln!(out, "\t\t{}", self.paint("If it is not in use, it may cause issues for new certificates created for the same domain.", warn))?;
            } else if status.dangling_resource {
                writeln!(out, "\t\t{}", self.paint("This secret was managed by cert-manager, but its Certificate resource now points to another secret.", warn))?;
                writeln!(
                    out,
                    "\t\t{}",
                    self.paint(
                        format!(
                            "All references to this secret should be replaced with \"{}\".",
                            status.dangling_resource_name
                        ),
                        warn
                    )
                )?;
                writeln!(out, "\t\t{}", self.paint("Once done, this secret should be deleted.", warn))?;
            } else {
                writeln!(out, "\t\tCert Manager Status: {}", status.status)?;
                writeln!(out, "\t\tCert Manager Message: {}", status.status_message)?;
            }
        }
        writeln!(out)
    }
}

impl Writer for TextWriter {
    fn write(&self, findings: &Findings, out: &mut dyn Write) -> io::Result<()> {
        for (namespace, secrets) in findings {
            writeln!(
                out,
                "\n{}\n",
                self.paint(format!("Namespace: {}", namespace), Style::new().green())
            )?;
            for finding in secrets {
                self.write_finding(namespace, finding, out)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}
