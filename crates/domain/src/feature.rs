use std::str::FromStr;

use grcpilot_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{PromptContext, PromptTemplate, TaskKind};

/// Instruction appended to every free-text prompt.
pub const PLAIN_TEXT_INSTRUCTION: &str = "IMPORTANT: Do NOT use markdown symbols like ###, ##, **, or * for formatting. Use plain text only. Use ALL CAPS for section headers. Use simple bullet points (•) for lists. Do not use markdown tables; use structured plain text instead.";

const TARGET_MODULE_SLOT: &str = "target_module";

/// Static description of one AI call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiFeatureDescriptor {
    /// Audit module label.
    pub module: &'static str,
    /// Audit action label.
    pub action: &'static str,
    /// Normalization policy for the response.
    pub task: TaskKind,
    /// Prompt template.
    pub template: PromptTemplate,
    /// Subject of the degraded message shown when the call fails.
    pub unavailable_label: &'static str,
    /// Per-slot character limits applied before interpolation.
    pub slot_limits: &'static [(&'static str, usize)],
}

/// AI-assisted features exposed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiFeature {
    /// Board-level insights over the risk register.
    RiskInsights,
    /// Executive summary over dashboard data.
    BoardReport,
    /// Impact assessment for a new regulation.
    RegulatoryImpact,
    /// Completion forecast for tracked actions.
    ActionRisk,
    /// Field extraction from an uploaded policy document.
    PolicyDocument,
    /// Health score across the asset registry.
    AssetPortfolio,
    /// Forensic health score for a single asset.
    AssetHealth,
    /// Gap analysis of a policy against a framework.
    PolicyGap,
    /// Policy or SOP authoring.
    PolicySop,
    /// Clause drafting for a policy gap.
    Remediation,
    /// Management response to an audit finding.
    AuditResponse,
    /// Five-why root cause analysis of an audit finding.
    AuditRootCause,
    /// Assurance maturity over audit findings.
    AuditInsights,
    /// Drafting of a managed document.
    DocumentDraft,
    /// Instruction-driven edit of document content.
    DocumentEdit,
    /// Compliance improvement suggestions for a document.
    DocumentImprovements,
    /// Modernised draft of an existing document.
    UpdateDraft,
    /// Vulnerability impact analysis.
    Vulnerability,
    /// Crisis analysis of an incident.
    Incident,
    /// Mapping of tabular data to a module schema.
    TabularIngestion,
}

impl AiFeature {
    /// Returns all known features.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AiFeature] = &[
            AiFeature::RiskInsights,
            AiFeature::BoardReport,
            AiFeature::RegulatoryImpact,
            AiFeature::ActionRisk,
            AiFeature::PolicyDocument,
            AiFeature::AssetPortfolio,
            AiFeature::AssetHealth,
            AiFeature::PolicyGap,
            AiFeature::PolicySop,
            AiFeature::Remediation,
            AiFeature::AuditResponse,
            AiFeature::AuditRootCause,
            AiFeature::AuditInsights,
            AiFeature::DocumentDraft,
            AiFeature::DocumentEdit,
            AiFeature::DocumentImprovements,
            AiFeature::UpdateDraft,
            AiFeature::Vulnerability,
            AiFeature::Incident,
            AiFeature::TabularIngestion,
        ];

        ALL
    }

    /// Returns the stable command-line name of this feature.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskInsights => "risk-insights",
            Self::BoardReport => "board-report",
            Self::RegulatoryImpact => "regulatory-impact",
            Self::ActionRisk => "action-risk",
            Self::PolicyDocument => "policy-document",
            Self::AssetPortfolio => "asset-portfolio",
            Self::AssetHealth => "asset-health",
            Self::PolicyGap => "policy-gap",
            Self::PolicySop => "policy-sop",
            Self::Remediation => "remediation",
            Self::AuditResponse => "audit-response",
            Self::AuditRootCause => "audit-root-cause",
            Self::AuditInsights => "audit-insights",
            Self::DocumentDraft => "document-draft",
            Self::DocumentEdit => "document-edit",
            Self::DocumentImprovements => "document-improvements",
            Self::UpdateDraft => "update-draft",
            Self::Vulnerability => "vulnerability",
            Self::Incident => "incident",
            Self::TabularIngestion => "tabular-ingestion",
        }
    }

    /// Returns the static descriptor for this feature.
    #[must_use]
    pub fn descriptor(&self) -> AiFeatureDescriptor {
        match self {
            Self::RiskInsights => plain_text(
                "Risk Register",
                "Strategic Insights",
                "Risk analysis",
                "Analyze the following risk data and provide 3 key insights for the Board: {{risk_data}}.",
            ),
            Self::BoardReport => plain_text(
                "Reporting",
                "Board Summary Generation",
                "Board report generation",
                "As an AI Risk Analyst, write a professional Board Executive Summary based on this GRC data: {{grc_data}}. Use a formal, strategic tone.",
            ),
            Self::RegulatoryImpact => plain_text(
                "Regulatory Monitoring",
                "Impact Assessment",
                "Regulatory analysis",
                "Perform a high-level Regulatory Impact Assessment for \"{{regulation_name}}\". Summary: {{summary}}.\nIdentify:\n1. Key Obligations\n2. Potential Business Risks\n3. Suggested Internal Control Updates.",
            ),
            Self::ActionRisk => plain_text(
                "Action Tracking",
                "Predictive Success Analysis",
                "Action risk prediction",
                "Analyze the following GRC action items and predict completion probability.\nData: {{action_data}}.\nProvide:\n1. INDIVIDUAL PREDICTIONS\n2. BOTTLENECK ANALYSIS\n3. MITIGATION STRATEGY",
            ),
            Self::PolicyDocument => AiFeatureDescriptor {
                module: "Policy Intelligence",
                action: "Document Ingestion",
                task: TaskKind::StructuredList,
                template: PromptTemplate::new(
                    "Analyze the attached document content and extract: title, type (Policy/SOP), category, content summary, compliance score (0-100), and review cycle.\n\nDocument content: {{document}}\n\nReturn as JSON: {\"name\": \"string\", \"type\": \"Policy|SOP\", \"category\": \"string\", \"content\": \"string\", \"complianceScore\": number, \"reviewCycle\": \"6 Months|1 Year|2 Years|3 Years\"}",
                ),
                unavailable_label: "Document analysis",
                slot_limits: &[("document", 2000)],
            },
            Self::AssetPortfolio => structured(
                "Asset Registry",
                "Portfolio Health Analysis",
                TaskKind::StructuredScore,
                "Asset analysis",
                "Analyze the following digital asset registry data.\nTask:\n1. Calculate Health Score (0-100)\n2. Provide Summary\n3. Actionable Recommendations\n4. Critical Replacements.\n\nAsset Data: {{asset_data}}\n\nReturn as JSON with: {\"healthScore\": number, \"summary\": \"string\", \"recommendations\": [\"string\"], \"criticalReplacements\": [{\"assetId\": \"string\", \"reason\": \"string\"}]}",
            ),
            Self::AssetHealth => structured(
                "Asset Registry",
                "Individual Health Audit",
                TaskKind::StructuredScore,
                "Asset health audit",
                "Perform a forensic health audit for Digital Asset: {{asset}}.\nAssociated Vulnerabilities: {{vulnerabilities}}.\n\nCalculate a 0-100 Health Score where:\n- 90-100: Pristine (No open vulns, current warranty)\n- 70-89: Warning (Minor vulns, aging hardware)\n- 0-69: Critical Risk (Critical unpatched vulns, EOL hardware)\n\nReturn JSON: {\"healthScore\": number, \"decomposition\": [\"factor1\", \"factor2\"], \"recommendation\": \"string\"}",
            ),
            Self::PolicyGap => structured(
                "Policy Intelligence",
                "Gap Analysis",
                TaskKind::StructuredScore,
                "Policy gap analysis",
                "Analyze policy \"{{policy_name}}\" against {{framework}} framework.\n\nReturn JSON: {\"score\": number, \"gaps\": [\"gap1\", \"gap2\"], \"recommendations\": [\"rec1\", \"rec2\"]}",
            ),
            Self::PolicySop => plain_text(
                "Policy Intelligence",
                "SOP Generation",
                "Policy generation",
                "Create enterprise {{document_type}} for \"{{company_name}}\". Title: \"{{title}}\". Requirements: {{requirements}}.",
            ),
            Self::Remediation => plain_text(
                "Policy Intelligence",
                "Remediation Drafting",
                "Remediation content generation",
                "Write POLICY CLAUSE and IMPLEMENTATION STEPS for gap in \"{{policy_name}}\": \"{{recommendation}}\".",
            ),
            Self::AuditResponse => plain_text(
                "Audit Co-Pilot",
                "Management Response Draft",
                "Audit response drafting",
                "Draft management response for audit: \"{{audit_title}}\". Severity: {{severity}}. Dept: {{department}}.",
            ),
            Self::AuditRootCause => plain_text(
                "Audit Co-Pilot",
                "Root Cause Analysis",
                "Root cause analysis",
                "Perform 5-Why RCA for: \"{{audit_title}}\". Severity: {{severity}}.",
            ),
            Self::AuditInsights => structured(
                "Audit Co-Pilot",
                "Assurance Insights",
                TaskKind::StructuredList,
                "Audit insights",
                "Analyze these audit findings and provide assurance maturity score (0-100), trend, and top risks. {{audits}}\n\nReturn JSON: {\"maturityScore\": number, \"maturityTrend\": \"string\", \"topRisks\": [{\"title\": \"string\", \"description\": \"string\"}]}",
            ),
            Self::DocumentDraft => plain_text(
                "Document Management",
                "Document Drafting",
                "Document drafting",
                "Draft formal document: \"{{request}}\". Context: {{context}}. Cycle: {{cycle}}.",
            ),
            Self::DocumentEdit => plain_text(
                "Document Management",
                "AI Edit",
                "Document editing",
                "Refine content based on: \"{{instruction}}\". Content: {{content}}.",
            ),
            Self::DocumentImprovements => plain_text(
                "Document Management",
                "Improvement Suggestions",
                "Document improvement suggestions",
                "Suggest compliance improvements for: {{content}}.",
            ),
            Self::UpdateDraft => plain_text(
                "Document Management",
                "Update Draft",
                "Update draft generation",
                "Modernize draft for \"{{title}}\": {{content}}.",
            ),
            Self::Vulnerability => plain_text(
                "Asset Registry",
                "Vulnerability Analysis",
                "Vulnerability analysis",
                "Analyze vulnerability \"{{title}}\" for assets: {{asset_context}}.",
            ),
            Self::Incident => plain_text(
                "Incident Management",
                "Crisis Analysis",
                "Incident analysis",
                "Crisis analysis for incident: \"{{description}}\".",
            ),
            Self::TabularIngestion => AiFeatureDescriptor {
                module: "Bulk Ingestion",
                action: "Tabular Import",
                task: TaskKind::TabularIngestion,
                template: PromptTemplate::new(
                    "Analyze the following data and convert it to the {{target_module}} module format.\nMap the columns intelligently even if names don't match exactly.\n{{schema_example}}\n\nData to analyze: {{data}}\n\nReturn only a valid JSON array of objects matching the schema.",
                ),
                unavailable_label: "Bulk ingestion",
                slot_limits: &[("data", 1000)],
            },
        }
    }

    /// Renders the prompt text for this feature.
    ///
    /// Slot limits are applied first; free-text features then get the
    /// plain-text formatting instruction appended.
    #[must_use]
    pub fn render_prompt(&self, context: &PromptContext) -> String {
        let descriptor = self.descriptor();
        let mut limited = context.clone();
        for (slot, max_chars) in descriptor.slot_limits {
            if let Some(value) = context.get(slot) {
                limited.insert(*slot, value.truncated(*max_chars));
            }
        }

        let rendered = descriptor.template.interpolate(&limited);
        match descriptor.task {
            TaskKind::FreeTextInsight => format!("{rendered} {PLAIN_TEXT_INSTRUCTION}"),
            _ => rendered,
        }
    }
}

impl AiFeature {
    /// Returns the audit action recorded for a call with `context`.
    ///
    /// Tabular ingestion names the module it loaded, e.g. `Risk Import`.
    #[must_use]
    pub fn audit_action(&self, context: &PromptContext) -> String {
        match (self, context.get(TARGET_MODULE_SLOT)) {
            (Self::TabularIngestion, Some(target_module)) => format!("{target_module} Import"),
            _ => self.descriptor().action.to_owned(),
        }
    }
}

impl FromStr for AiFeature {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|feature| feature.as_str() == value)
            .ok_or_else(|| AppError::NotFound(format!("unknown AI feature '{value}'")))
    }
}

fn plain_text(
    module: &'static str,
    action: &'static str,
    unavailable_label: &'static str,
    body: &'static str,
) -> AiFeatureDescriptor {
    structured(
        module,
        action,
        TaskKind::FreeTextInsight,
        unavailable_label,
        body,
    )
}

fn structured(
    module: &'static str,
    action: &'static str,
    task: TaskKind,
    unavailable_label: &'static str,
    body: &'static str,
) -> AiFeatureDescriptor {
    AiFeatureDescriptor {
        module,
        action,
        task,
        template: PromptTemplate::new(body),
        unavailable_label,
        slot_limits: &[],
    }
}

/// Target module for tabular ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngestionTarget {
    /// Risk register rows.
    Risk,
    /// Audit findings.
    Audit,
    /// Platform users.
    User,
    /// Asset registry rows.
    Asset,
    /// Tracked regulations.
    Regulation,
    /// Policies and SOPs.
    Policy,
}

impl IngestionTarget {
    /// Returns the module name used in prompts.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Risk => "Risk",
            Self::Audit => "Audit",
            Self::User => "User",
            Self::Asset => "Asset",
            Self::Regulation => "Regulation",
            Self::Policy => "Policy",
        }
    }

    /// Returns the record example shown to the model, if the module has one.
    #[must_use]
    pub fn schema_example(&self) -> &'static str {
        match self {
            Self::Risk => {
                "Example: [{\"title\": \"Data Breach Risk\", \"description\": \"Risk of unauthorized access\", \"impact\": 4, \"likelihood\": 3, \"owner\": \"IT Security\", \"status\": \"Open\"}]"
            }
            Self::Audit => {
                "Example: [{\"title\": \"Access Control Review\", \"severity\": \"High\", \"department\": \"IT\", \"dueDate\": \"2024-12-31\", \"completionStatus\": 75}]"
            }
            Self::User => {
                "Example: [{\"name\": \"John Doe\", \"email\": \"john@company.com\", \"role\": \"Risk Manager\", \"status\": \"Active\"}]"
            }
            Self::Asset => {
                "Example: [{\"name\": \"Web Server\", \"manufacturer\": \"Dell\", \"type\": \"Server\", \"serialNumber\": \"SN123\", \"value\": 5000, \"riskLevel\": \"High\", \"responsibleTeam\": \"IT\"}]"
            }
            Self::Regulation => "",
            Self::Policy => {
                "Example: [{\"name\": \"Data Protection Policy\", \"type\": \"Policy\", \"category\": \"Security\", \"reviewCycle\": \"1 Year\", \"complianceScore\": 85, \"status\": \"Active\"}]"
            }
        }
    }

    /// Builds the prompt context for ingesting `data` into this module.
    #[must_use]
    pub fn ingestion_context(&self, data: impl Into<String>) -> PromptContext {
        PromptContext::new()
            .with(TARGET_MODULE_SLOT, self.as_str())
            .with("schema_example", self.schema_example())
            .with("data", data.into())
    }
}

impl FromStr for IngestionTarget {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "risk" => Ok(Self::Risk),
            "audit" => Ok(Self::Audit),
            "user" => Ok(Self::User),
            "asset" => Ok(Self::Asset),
            "regulation" => Ok(Self::Regulation),
            "policy" => Ok(Self::Policy),
            _ => Err(AppError::Validation(format!(
                "unknown ingestion target '{value}'"
            ))),
        }
    }
}
