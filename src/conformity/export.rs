//! Fixed-shape JSON export of a calibration analysis
//!
//! Field names follow the Portuguese vocabulary used on certificates and
//! review reports. Output only: nothing here reads the format back.

use serde::Serialize;

use super::analysis::{CalibrationAnalysis, CalibrationRange};
use super::point::CalibrationPoint;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisExport<'a> {
    faixa_calibracao: RangeExport<'a>,
    faixa_operacional: RangeExport<'a>,
    faixa_operacional_contida: bool,
    pontos_calibracao: Vec<PointExport<'a>>,
    avaliacao_conformidade: AssessmentExport<'a>,
    recomendacao: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RangeExport<'a> {
    minimo: f64,
    maximo: f64,
    unidade: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PointExport<'a> {
    ponto: &'a str,
    valor_referencia: f64,
    valor_medido: f64,
    erro: f64,
    incerteza: f64,
    erro_maximo_admissivel: f64,
    conforme: bool,
    calculo_automatico: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    justificativa: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentExport<'a> {
    total_pontos: usize,
    pontos_conformes: usize,
    pontos_nao_conformes: usize,
    lista_nao_conformes: &'a [String],
    situacao: String,
    resumo: &'a str,
    regra_decisao: &'a str,
    descricao_regra_decisao: &'a str,
    nivel_confianca: &'a str,
}

impl<'a> From<&'a CalibrationRange> for RangeExport<'a> {
    fn from(range: &'a CalibrationRange) -> Self {
        Self {
            minimo: range.min,
            maximo: range.max,
            unidade: &range.unit,
        }
    }
}

impl<'a> From<&'a CalibrationPoint> for PointExport<'a> {
    fn from(p: &'a CalibrationPoint) -> Self {
        Self {
            ponto: &p.point,
            valor_referencia: p.reference_value,
            valor_medido: p.measured_value,
            erro: p.error,
            incerteza: p.uncertainty,
            erro_maximo_admissivel: p.error_limit,
            conforme: p.ok,
            calculo_automatico: p.is_auto_calculated(),
            justificativa: p.justification.as_deref(),
        }
    }
}

/// Serialize an analysis to pretty-printed JSON
pub fn export_calibration_analysis_to_json(
    analysis: &CalibrationAnalysis,
) -> serde_json::Result<String> {
    let a = &analysis.assessment;
    let export = AnalysisExport {
        faixa_calibracao: (&analysis.calibration_range).into(),
        faixa_operacional: (&analysis.operational_range).into(),
        faixa_operacional_contida: analysis.operational_within_calibration,
        pontos_calibracao: analysis.points.iter().map(PointExport::from).collect(),
        avaliacao_conformidade: AssessmentExport {
            total_pontos: a.total_points,
            pontos_conformes: a.conforming_points,
            pontos_nao_conformes: a.non_conforming_points,
            lista_nao_conformes: &a.non_conforming_labels,
            situacao: a.status.to_string(),
            resumo: &a.summary,
            regra_decisao: &a.decision_rule,
            descricao_regra_decisao: &a.decision_rule_description,
            nivel_confianca: &a.confidence_level,
        },
        recomendacao: analysis.recommendation.to_string(),
    };
    serde_json::to_string_pretty(&export)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformity::analysis::generate_calibration_analysis;
    use crate::conformity::point::process_calibration_point;
    use serde_json::Value;

    fn sample() -> CalibrationAnalysis {
        let points = vec![
            process_calibration_point("P1", 0.0, 0.3, 0.05, 0.2),
            process_calibration_point("P2", 50.0, 50.05, 0.02, 0.1),
        ];
        generate_calibration_analysis(points, CalibrationRange::new(0.0, 100.0, "°C"), None)
    }

    #[test]
    fn test_export_shape() {
        let json = export_calibration_analysis_to_json(&sample()).unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(v["faixaCalibracao"]["unidade"], "°C");
        assert_eq!(v["faixaOperacional"]["maximo"], 100.0);
        assert_eq!(v["pontosCalibracao"].as_array().unwrap().len(), 2);
        assert_eq!(v["pontosCalibracao"][0]["ponto"], "P1");
        assert_eq!(v["pontosCalibracao"][0]["conforme"], false);
        assert_eq!(v["pontosCalibracao"][1]["erro"], 0.05);
        assert_eq!(v["pontosCalibracao"][1]["calculoAutomatico"], true);
        assert_eq!(v["avaliacaoConformidade"]["totalPontos"], 2);
        assert_eq!(v["avaliacaoConformidade"]["listaNaoConformes"][0], "P1");
        assert_eq!(v["avaliacaoConformidade"]["regraDecisao"], "|Erro| + U ≤ EMA");
        assert!(v["recomendacao"].as_str().unwrap().contains("50"));
    }

    #[test]
    fn test_export_carries_manual_justification() {
        let mut analysis = sample();
        analysis.points[0].override_status(true, "Ponto fora da faixa de uso");
        let json = export_calibration_analysis_to_json(&analysis).unwrap();
        let v: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(v["pontosCalibracao"][0]["calculoAutomatico"], false);
        assert_eq!(
            v["pontosCalibracao"][0]["justificativa"],
            "Ponto fora da faixa de uso"
        );
        assert!(v["pontosCalibracao"][1].get("justificativa").is_none());
    }

    #[test]
    fn test_export_is_deterministic() {
        let a = export_calibration_analysis_to_json(&sample()).unwrap();
        let b = export_calibration_analysis_to_json(&sample()).unwrap();
        assert_eq!(a, b);
    }
}
