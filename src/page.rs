// Smile Bot Relay — embedded chat page
//
// Served from `GET /` as one self-contained HTML document; no build step and
// no secrets embedded. The page script is the client Session Controller:
//   - persistent WebSocket to /ws, scheme mirroring the page's own
//   - one reconnect attempt 3000 ms after every close, repeating forever
//   - a current-sector selection; four sectors are pure UI overlays and
//     never touch the network
//   - a single typing placeholder while a query is in flight
//   - transcript mirrored to one localStorage key, capped at the newest
//     200 entries

const PAGE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>__TITLE__</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',sans-serif;background:#1e1e1e;color:#cccccc;height:100vh;display:flex;flex-direction:column}
.header{padding:14px 20px;background:#252526;border-bottom:1px solid #3c3c3c;display:flex;align-items:center;gap:12px}
.header h1{font-size:16px;font-weight:600;color:#4fc3f7}
.header .dot{width:8px;height:8px;border-radius:50%;background:#a33;transition:background .3s}
.header .dot.online{background:#0f0}
.sectors{padding:8px 16px;background:#252526;border-bottom:1px solid #3c3c3c;display:flex;gap:6px;flex-wrap:wrap}
.sector{padding:6px 12px;border:1px solid #3c3c3c;border-radius:14px;background:#313131;color:#cccccc;font-size:13px;cursor:pointer}
.sector.active{border-color:#4fc3f7;color:#4fc3f7}
.messages{flex:1;overflow-y:auto;padding:20px;display:flex;flex-direction:column;gap:10px}
.msg{max-width:80%;padding:10px 14px;border-radius:12px;font-size:14px;line-height:1.5;word-wrap:break-word;white-space:pre-wrap}
.msg.user{align-self:flex-end;background:#2a2d2e;border:1px solid #4fc3f733}
.msg.bot{align-self:flex-start;background:#252526;border:1px solid #3c3c3c}
.msg.system{align-self:center;color:#888;font-size:12px;font-style:italic}
.msg.error{align-self:flex-start;color:#f44;border:1px solid #f443}
.typing{align-self:flex-start;color:#888;font-size:13px;padding:4px 14px}
.typing::after{content:'...';animation:dots 1.2s infinite}
@keyframes dots{0%,20%{content:'.'}40%{content:'..'}60%,100%{content:'...'}}
.input-bar{padding:14px 20px;background:#252526;border-top:1px solid #3c3c3c;display:flex;gap:8px}
.input-bar textarea{flex:1;padding:10px 14px;border:1px solid #3c3c3c;border-radius:8px;background:#313131;color:#cccccc;font-size:14px;font-family:inherit;resize:none;outline:none;max-height:120px}
.input-bar textarea:focus{border-color:#4fc3f7}
.input-bar button{padding:10px 18px;background:#4fc3f7;color:#123;border:none;border-radius:8px;font-weight:600;cursor:pointer;white-space:nowrap}
.input-bar button:disabled{opacity:.4;cursor:not-allowed}
.input-bar label{align-self:center;color:#888;cursor:pointer;font-size:18px}
.overlay{display:none;position:fixed;inset:0;background:#0009;align-items:center;justify-content:center}
.overlay.open{display:flex}
.overlay .panel{background:#252526;border:1px solid #3c3c3c;border-radius:12px;padding:24px;max-width:420px;width:90%}
.overlay .panel h2{font-size:15px;color:#4fc3f7;margin-bottom:12px}
.overlay .panel a{display:block;color:#cccccc;padding:8px 0;text-decoration:none}
.overlay .panel a:hover{color:#4fc3f7}
.overlay .close{float:right;cursor:pointer;color:#888}
</style>
</head>
<body>
<div class="header">
  <div class="dot" id="dot"></div>
  <h1>__TITLE__</h1>
</div>
<div class="sectors" id="sectors"></div>
<div class="messages" id="messages"></div>
<div class="input-bar">
  <label for="fileInput" title="Upload a file">&#128206;</label>
  <input id="fileInput" type="file" style="display:none" />
  <textarea id="chatInput" placeholder="Type a message..." rows="1"></textarea>
  <button id="sendBtn" onclick="sendMessage()">Send</button>
</div>
<div class="overlay" id="overlay">
  <div class="panel">
    <span class="close" onclick="closeOverlay()">&times;</span>
    <div id="overlayBody"></div>
  </div>
</div>
<script>
const STORAGE_KEY="chatHistory";
const MAX_ENTRIES=200;
const RECONNECT_MS=3000;
const SERVER_SECTORS=["Education","Dictionary","Weather","Entertainment","Wellbeing","News","Books","Recipes","Assistant"];
const UI_SECTORS={
  "Movies":'<h2>Movies &amp; Reels</h2><a href="https://www.youtube.com/movies" target="_blank" rel="noopener">YouTube Movies</a><a href="https://vimeo.com/watch" target="_blank" rel="noopener">Vimeo</a>',
  "Funwhile":'<h2>Games</h2><a href="https://www.crazygames.com" target="_blank" rel="noopener">CrazyGames</a><a href="https://poki.com" target="_blank" rel="noopener">Poki Games</a>',
  "Bible":'<h2>Bible</h2><a href="https://www.bible.com" target="_blank" rel="noopener">Read online</a>',
  "Calculator":'<h2>Calculator</h2><a href="https://www.desmos.com/scientific" target="_blank" rel="noopener">Open calculator</a>'
};

let ws=null;
let currentSector="Education";
const msgs=document.getElementById("messages");
const input=document.getElementById("chatInput");
const sendBtn=document.getElementById("sendBtn");
const dot=document.getElementById("dot");

function connect(){
  if(ws&&(ws.readyState===WebSocket.CONNECTING||ws.readyState===WebSocket.OPEN))return;
  const proto=location.protocol==="https:"?"wss:":"ws:";
  ws=new WebSocket(proto+"//"+location.host+"/ws");
  ws.onopen=()=>{dot.classList.add("online");};
  ws.onclose=()=>{
    dot.classList.remove("online");
    setTimeout(connect,RECONNECT_MS);
  };
  ws.onmessage=(event)=>{
    let data;
    try{data=JSON.parse(event.data);}catch(e){return;}
    if(data.type==="ai_response"){
      removeTyping();
      addMsg("bot",formatResponse(data.results));
      enableInput();
    }else if(data.type==="connection_status"){
      dot.classList.add("online");
    }else if(data.type==="error"){
      removeTyping();
      addMsg("error",data.message||"Server error");
      enableInput();
    }
  };
}

function initSectors(){
  const row=document.getElementById("sectors");
  SERVER_SECTORS.concat(Object.keys(UI_SECTORS)).forEach(name=>{
    const b=document.createElement("button");
    b.className="sector"+(name===currentSector?" active":"");
    b.dataset.sector=name;
    b.textContent=name;
    b.onclick=()=>selectSector(name,b);
    row.appendChild(b);
  });
}

function selectSector(name,btn){
  document.querySelectorAll(".sector").forEach(s=>s.classList.remove("active"));
  btn.classList.add("active");
  currentSector=name;
  if(UI_SECTORS[name]){
    openOverlay(name);
  }else{
    addMsg("system","Switched to "+name+" mode. How can I help you?");
  }
}

function sendMessage(){
  const text=input.value.trim();
  if(!text)return;
  if(UI_SECTORS[currentSector]){
    addMsg("user",text);
    input.value="";
    openOverlay(currentSector);
    return;
  }
  input.disabled=true;
  sendBtn.disabled=true;
  addMsg("user",text);
  input.value="";
  showTyping();
  if(ws&&ws.readyState===WebSocket.OPEN){
    ws.send(JSON.stringify({type:"ai_query",query:text,sector:currentSector}));
  }else{
    removeTyping();
    addMsg("error","Connection lost. Reconnecting...");
    connect();
    enableInput();
  }
}

function enableInput(){
  input.disabled=false;
  sendBtn.disabled=false;
  input.focus();
}

function formatResponse(data){
  if(typeof data==="string")return data;
  if(data.message)return data.message;
  if(data.response)return data.response;
  if(data.reply)return data.reply;
  if(data.error)return "Error: "+data.error;
  return JSON.stringify(data);
}

function addMsg(type,text){
  const d=document.createElement("div");
  d.className="msg "+type;
  d.textContent=text;
  msgs.appendChild(d);
  msgs.scrollTop=msgs.scrollHeight;
  saveChat();
}

function showTyping(){
  removeTyping();
  const d=document.createElement("div");
  d.className="typing";
  d.textContent="Thinking";
  msgs.appendChild(d);
  msgs.scrollTop=msgs.scrollHeight;
}

function removeTyping(){
  document.querySelectorAll(".typing").forEach(el=>el.remove());
}

function saveChat(){
  const entries=msgs.querySelectorAll(".msg");
  for(let i=0;i<entries.length-MAX_ENTRIES;i++)entries[i].remove();
  localStorage.setItem(STORAGE_KEY,msgs.innerHTML);
}

function restoreChat(){
  const saved=localStorage.getItem(STORAGE_KEY);
  if(saved){
    msgs.innerHTML=saved;
    removeTyping();
    msgs.scrollTop=msgs.scrollHeight;
  }
}

function openOverlay(name){
  document.getElementById("overlayBody").innerHTML=UI_SECTORS[name];
  document.getElementById("overlay").classList.add("open");
}
function closeOverlay(){
  document.getElementById("overlay").classList.remove("open");
}
document.getElementById("overlay").addEventListener("click",(e)=>{
  if(e.target.id==="overlay")closeOverlay();
});
document.addEventListener("keydown",(e)=>{
  if(e.key==="Escape")closeOverlay();
});

input.addEventListener("keydown",(e)=>{
  if(e.key==="Enter"&&!e.shiftKey){e.preventDefault();sendMessage();}
});

document.getElementById("fileInput").addEventListener("change",async(e)=>{
  const file=e.target.files[0];
  if(!file)return;
  const form=new FormData();
  form.append("file",file);
  try{
    const res=await fetch("/upload",{method:"POST",body:form});
    const data=await res.json();
    if(data.success){
      addMsg("system","Uploaded "+data.fileInfo.name+" ("+data.fileInfo.size+" bytes)");
    }else{
      addMsg("error",data.error||"Upload failed");
    }
  }catch(err){
    addMsg("error","Upload failed: "+err.message);
  }
  e.target.value="";
});

restoreChat();
initSectors();
connect();
</script>
</body>
</html>"##;

/// Render the chat page with the configured title.
pub fn build_chat_page(title: &str) -> String {
    // textContent-free spots only; keep the title HTML-safe.
    let safe = title
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    PAGE_TEMPLATE.replace("__TITLE__", &safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_substitution_and_escape() {
        let page = build_chat_page("My <Bot> & Co");
        assert!(page.contains("<title>My &lt;Bot&gt; &amp; Co</title>"));
        assert!(!page.contains("__TITLE__"));
    }

    #[test]
    fn test_session_controller_wiring_present() {
        let page = build_chat_page("x");
        // Reconnect policy, storage key, and the wire message type all live
        // in the page script.
        assert!(page.contains("RECONNECT_MS=3000"));
        assert!(page.contains("chatHistory"));
        assert!(page.contains("\"ai_query\""));
        assert!(page.contains("/ws"));
    }
}
