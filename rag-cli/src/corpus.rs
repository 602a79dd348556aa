//! Sample corpus loaded by `rag seed`.

pub const SAMPLE_DOCUMENTS: &[&str] = &[
    "มีอะไรให้ช่วยไหมครับ",
    "งาน BUU-Bootcamp-2024 จัดขึ้นที่มหาวิทยาลัยบูรพาในวันที่ 25 มกราคม ค.ศ. 2024 โดยมีกิจกรรมที่เกี่ยวข้องกับการพัฒนาซอฟต์แวร์ตั้งแต่เวลา 9:00 น. ถึง 16:00 น.",
    "ในปีการศึกษา 2565 สาขาวิชา AI มหาวิทยาลัยบูรพามีนักศึกษาจำนวน 100 คน และมีอาจารย์ที่ปรึกษาจำนวน 10 คน",
    "ตรีโกณมิติเป็นเครื่องมือที่สำคัญในคณิตศาสตร์ ผมชอบที่มันสามารถนำมาประยุกต์ใช้ในการแก้ปัญหาจริง เช่น การคำนวณระยะทางระหว่างจุดต่างๆ",
    "แคลคูลัสเป็นเครื่องมือสำคัญที่ทำให้เราเข้าใจการเปลี่ยนแปลง ผมคิดว่าในชีวิตจริงเราก็เจอการเปลี่ยนแปลงตลอดเวลา เช่น การหาความเร็วของรถที่เคลื่อนที่ไปในเส้นทางที่ไม่ตรง",
    "ฟิสิกส์ทำให้เราเข้าใจโลกและจักรวาลมากขึ้น กฎของนิวตันง่ายแต่ทรงพลัง ทำให้เรารู้ว่าแรงมักเกิดจากการโต้ตอบระหว่างวัตถุสองชิ้น",
    "ฟิสิกส์ควอนตัมเป็นสิ่งที่น่าตื่นเต้น หลักการไม่แน่นอนของไฮเซนเบิร์กทำให้รู้สึกว่าเราไม่สามารถรู้ได้ทุกอย่างอย่างสมบูรณ์เหมือนในชีวิตจริง",
    "ในดาราศาสตร์ ผมรู้สึกทึ่งที่จักรวาลมีขนาดใหญ่มาก หลุมดำเป็นอีกหนึ่งสิ่งที่น่าสนใจ ผมคิดว่ามันเหมือนกับความลับที่รอให้เราไปค้นหามากกว่าแค่เป็นวัตถุในจักรวาล",
    "ทฤษฎีบิ๊กแบงทำให้เราเข้าใจว่าทำไมจักรวาลขยายตัวออกไป และว่ามันเริ่มต้นจากการระเบิดมหาศาลเมื่อ 13.8 พันล้านปีก่อน",
    "กระบวนการฟิวชันในดาวฤกษ์ก็เหมือนกับปฏิกิริยาที่เกิดขึ้นในโรงงานพลังงานที่ใหญ่ที่สุดในจักรวาล ซึ่งทำให้ชีวิตบนโลกนี้เป็นไปได้",
    "ดาวหางเหมือนกับการเดินทางในเวลาของจักรวาล เมื่อมันเคลื่อนที่ใกล้ดวงอาทิตย์ มันทำให้เราได้เห็นสิ่งที่เกิดขึ้นในอดีต",
    "ผมเชื่อว่าเมื่อมนุษย์สามารถศึกษาและเข้าใจจักรวาลได้ลึกซึ้งมากขึ้น ก็จะสามารถนำความรู้เหล่านั้นมาปรับใช้ในชีวิตและอนาคตได้",
    "ดาราศาสตร์ไม่ใช่แค่การมองผ่านกล้องโทรทรรศน์ แต่เป็นการมองไปข้างหน้าเพื่อเข้าใจการเกิดและการดำรงอยู่ของเราในจักรวาลนี้",
    "ในโลกของฟิสิกส์และคณิตศาสตร์ เรามักจะเจอปัญหาที่มีหลายวิธีในการแก้ไข แต่สิ่งที่สำคัญคือการใช้วิธีที่เหมาะสมที่สุดสำหรับปัญหานั้นๆ",
    "ดาวฤกษ์ไม่ใช่แค่แหล่งแสง แต่เป็นแหล่งพลังงานที่สำคัญสำหรับการสนับสนุนการเติบโตและการเปลี่ยนแปลงในจักรวาล",
    "ในชีวิตการเรียนรู้ที่สำคัญที่สุดคือการคิดและตั้งคำถามอยู่เสมอ โลกของวิทยาศาสตร์ไม่เคยหยุดนิ่ง และเราก็ไม่ควรหยุดเรียนรู้",
    "สำหรับผมการเรียนรู้คณิตศาสตร์และฟิสิกส์ทำให้โลกและจักรวาลนี้ดูน่าสนใจมากขึ้น ทุกวันมันช่วยให้ผมเข้าใจการทำงานของสิ่งต่างๆ ได้ดียิ่งขึ้น",
    "คณิตศาสตร์ไม่ใช่แค่การคำนวณ แต่เป็นภาษาของจักรวาลที่เราใช้เพื่อเข้าใจสิ่งต่างๆ รอบตัว เช่น การวิเคราะห์ความสัมพันธ์ของพลังงานกับมวลในฟิสิกส์",
    "ในฟิสิกส์ โมเดลของแรงโน้มถ่วงของไอน์สไตน์ได้เปลี่ยนวิธีที่เรามองโลกไปเลย มันไม่เพียงแค่การบอกว่ามีแรงที่ดึงดูด แต่บอกว่าเวลาและอวกาศเองก็โค้งงอเพราะมวล",
    "โลกของ AI ก็เช่นกัน มันไม่ใช่แค่เทคโนโลยีใหม่ แต่เป็นการเปลี่ยนแปลงวิธีที่เราทำงานและใช้ชีวิต ไม่ว่าจะเป็นในเรื่องของการวิเคราะห์ข้อมูลหรือการสร้างระบบอัจฉริยะ",
    "การเรียนรู้ของเครื่อง (Machine Learning) เป็นสาขาหนึ่งของ AI ที่ทำให้เครื่องจักรสามารถเรียนรู้จากข้อมูลและปรับปรุงตัวเองได้โดยไม่ต้องมีการโปรแกรมโดยตรง",
    "ในดาราศาสตร์ การสังเกตการณ์จากกล้องโทรทรรศน์ช่วยให้เราเห็นได้ถึงความลึกของจักรวาล หลุมดำในศูนย์กลางของกาแล็กซีมักจะเป็นตัวที่ดึงดูดข้อมูลจากสภาพแวดล้อมรอบๆ",
    "ความรู้ทางคณิตศาสตร์และฟิสิกส์ช่วยให้เรามีเครื่องมือในการเข้าใจโลกทั้งในแง่ของมิติของเวลาและอวกาศ เช่น การศึกษาดาวฤกษ์ในแง่ของการฟิวชัน",
    "ระบบสุริยะของเรามีดาวเคราะห์ 8 ดวง รวมถึงโลกที่เราอาศัยอยู่ มันตั้งอยู่ในกาแล็กซีทางช้างเผือก ซึ่งมีดาวฤกษ์และดาวเคราะห์หลายหมื่นล้านดวง",
    "การศึกษาเกี่ยวกับหลุมดำทำให้เราเข้าใจพฤติกรรมของวัตถุที่มีความหนาแน่นสูงและแรงโน้มถ่วงที่ไม่สามารถหลบหนีได้ ซึ่งเป็นหัวข้อที่ทำให้การศึกษาในดาราศาสตร์น่าสนใจมากขึ้น",
    "ในฟิสิกส์โมเดลต่างๆ เช่น โมเดลของแรงไฟฟ้าหรือแม่เหล็ก ทำให้เราเข้าใจว่าความสัมพันธ์ระหว่างมวลและพลังงานในจักรวาลเกิดขึ้นอย่างไร",
    "การศึกษาเกี่ยวกับมุมมองของดาวเคราะห์จากโลกช่วยให้เราเข้าใจว่าโลกและดาวเคราะห์อื่นๆ มีลักษณะและวงโคจรที่แตกต่างกันไปในระบบสุริยะ",
    "ในแง่ของ AI การประมวลผลภาพ (Image Processing) ทำให้เครื่องจักรสามารถรู้จักและจำแนกรูปภาพ เช่น การใช้ในการตรวจจับวัตถุหรือการสแกนรหัส QR",
    "ทฤษฎีบิ๊กแบงช่วยให้เรารู้ว่าจักรวาลไม่ได้คงที่ แต่กำลังขยายตัวออกไปในทุกทิศทาง ซึ่งการศึกษานี้ช่วยให้เราเข้าใจจุดเริ่มต้นของจักรวาลที่เต็มไปด้วยความลึกลับ",
    "กระบวนการของฟิวชันในดวงอาทิตย์ทำให้เกิดพลังงานที่หล่อเลี้ยงชีวิตบนโลก แต่ในขณะเดียวกันมันก็ทำให้เราสามารถศึกษาฟิสิกส์ในระดับที่สูงขึ้น",
    "ดาราศาสตร์เป็นศาสตร์ที่ไม่มีวันหยุดพัฒนา เพราะการสังเกตการณ์ในอวกาศยังคงเผยให้เห็นเรื่องราวใหม่ๆ ทั้งจากการศึกษาเกี่ยวกับดาวเคราะห์นอกระบบและการขยายตัวของจักรวาล",
    "เมื่อพูดถึงวิทยาศาสตร์ ผมคิดว่าความรู้ที่ดีที่สุดคือลูกหลานของคำถามที่ยังไม่ได้คำตอบ และการค้นหาคำตอบใหม่ๆ ในดาราศาสตร์หรือฟิสิกส์ก็เป็นการสร้างทฤษฎีใหม่ๆ ที่อาจเปลี่ยนแปลงโลกนี้ได้",
    "ผมมีความฝันที่จะมีบ้านหลังใหญ่ ๆ ซึ่งจะเป็นที่ที่คนรอบข้างสามารถมาพักผ่อนและรู้สึกสบายในทุกๆ วัน ผมอยากให้ทุกคนรู้สึกอบอุ่นเหมือนเป็นครอบครัวเดียวกัน",
];

#[cfg(test)]
mod tests {
    use super::SAMPLE_DOCUMENTS;

    #[test]
    fn corpus_has_no_blank_entries() {
        assert!(!SAMPLE_DOCUMENTS.is_empty());
        assert!(SAMPLE_DOCUMENTS.iter().all(|doc| !doc.trim().is_empty()));
    }
}
